//! Composition of the three trackers for one published follow-up page.

use std::sync::Arc;

use crate::{
    confirmations::ConfirmationLedger,
    models::SectionId,
    platform::{Clock, ElementId, IntersectionEntry, Platform},
    session::SessionIdentity,
    settings::TrackerSettings,
    storage::KeyValueStore,
    tracker::{EngagementTracker, SectionTrackingOptions, SectionVisibilityTracker},
    transport::{Dispatcher, TelemetryTransport},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Everything a page borrows from its host.
#[derive(Clone)]
pub struct PageServices {
    pub platform: Arc<dyn Platform>,
    pub clock: Arc<dyn Clock>,
    pub transport: Arc<dyn TelemetryTransport>,
    /// Survives reloads of one tab; holds the session id.
    pub tab_store: Arc<dyn KeyValueStore>,
    /// Survives across tabs; holds the confirmation ledger.
    pub profile_store: Arc<dyn KeyValueStore>,
}

/// A mounted follow-up page. The trackers are siblings: none of them calls
/// another, they only share the session id and the dispatcher.
pub struct FollowupPage {
    page_id: String,
    engagement: EngagementTracker,
    sections: SectionVisibilityTracker,
    confirmations: ConfirmationLedger,
    dispatcher: Dispatcher,
    settings: TrackerSettings,
}

impl FollowupPage {
    pub fn new(
        page_id: &str,
        page_slug: Option<&str>,
        services: PageServices,
        settings: TrackerSettings,
        dispatcher: Dispatcher,
    ) -> Self {
        let session_id = SessionIdentity::new(services.tab_store).get_or_create_session_id();

        let engagement = EngagementTracker::new(
            session_id.clone(),
            services.platform.clone(),
            services.transport.clone(),
            dispatcher.clone(),
        );
        let sections = SectionVisibilityTracker::new(
            engagement.clone(),
            services.platform,
            services.clock,
            SectionTrackingOptions::from(&settings),
        );
        let confirmations = ConfirmationLedger::load(
            page_slug,
            Some(&session_id),
            services.profile_store,
            services.transport,
            settings.feedback_ttl(),
        );

        Self {
            page_id: page_id.to_string(),
            engagement,
            sections,
            confirmations,
            dispatcher,
            settings,
        }
    }

    /// Opens the view session, then starts watching sections and scrolling.
    pub async fn mount(&mut self) {
        log_debug!("mounting follow-up page {}", self.page_id);
        self.engagement.start(&self.page_id).await;
        self.sections.attach();
    }

    pub fn register_section(&mut self, element: Option<ElementId>, section_id: SectionId, title: &str) {
        self.sections.register_section(element, section_id, title);
    }

    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) {
        self.sections.handle_intersection(entries);
    }

    /// Returns `true` when the host should schedule an animation frame.
    pub fn on_scroll(&mut self) -> bool {
        self.sections.on_scroll()
    }

    pub fn on_animation_frame(&mut self) {
        self.sections.on_animation_frame();
    }

    /// Page hide / unload: report what is pending and end the session through
    /// the unload-safe path. The session is not reopened afterwards, so this
    /// must not be wired to plain visibility changes such as tab switches.
    pub fn on_page_hide(&mut self) {
        self.sections.flush_section_times();
        self.engagement.page_hide();
    }

    pub fn engagement(&self) -> &EngagementTracker {
        &self.engagement
    }

    pub fn sections(&self) -> &SectionVisibilityTracker {
        &self.sections
    }

    pub fn confirmations(&self) -> &ConfirmationLedger {
        &self.confirmations
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Unmounts the page and waits, bounded by the unload flush timeout, for
    /// outstanding telemetry. Returns `false` if some of it had to be abandoned.
    pub async fn teardown(mut self) -> bool {
        self.sections.teardown();
        self.engagement.page_hide();

        let drained = self
            .dispatcher
            .shutdown(self.settings.unload_flush_timeout())
            .await;
        if !drained {
            log_warn!(
                "follow-up page {} unmounted with telemetry still in flight",
                self.page_id
            );
        }
        drained
    }
}
