#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Notify;

use followup_engagement::{
    models::{
        Confirmation, CreateConfirmationRequest, EndSessionRequest, EventType, SessionHandle,
        StartSessionRequest, TrackEventRequest,
    },
    page::{FollowupPage, PageServices},
    platform::{HeadlessPlatform, ManualClock},
    storage::MemoryStore,
    tracker::{EngagementTracker, SectionTrackingOptions, SectionVisibilityTracker},
    transport::{Dispatcher, TelemetryTransport},
    TrackerSettings,
};

pub const SESSION_TOKEN: &str = "token-1";

#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub opens: Vec<StartSessionRequest>,
    pub events: Vec<TrackEventRequest>,
    pub ends: Vec<EndSessionRequest>,
    pub confirmations: Vec<(String, CreateConfirmationRequest)>,
}

/// Transport that keeps every request it sees. Opens and confirmations can be
/// made to fail or to hang until released.
#[derive(Default)]
pub struct RecordingTransport {
    recorded: Mutex<Recorded>,
    pub fail_open: AtomicBool,
    pub fail_confirm: AtomicBool,
    open_gate: Mutex<Option<Arc<Notify>>>,
    confirm_gate: Mutex<Option<Arc<Notify>>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }

    pub fn recorded(&self) -> Recorded {
        self.lock().clone()
    }

    pub fn opens(&self) -> usize {
        self.lock().opens.len()
    }

    pub fn ends(&self) -> usize {
        self.lock().ends.len()
    }

    pub fn confirmation_calls(&self) -> usize {
        self.lock().confirmations.len()
    }

    pub fn events(&self) -> Vec<TrackEventRequest> {
        self.lock().events.clone()
    }

    pub fn events_of(&self, event_type: &EventType) -> Vec<TrackEventRequest> {
        self.events()
            .into_iter()
            .filter(|event| &event.event_type == event_type)
            .collect()
    }

    pub fn payloads_of(&self, event_type: &EventType) -> Vec<Value> {
        self.events_of(event_type)
            .into_iter()
            .filter_map(|event| event.event_data)
            .collect()
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_confirm(&self, fail: bool) {
        self.fail_confirm.store(fail, Ordering::SeqCst);
    }

    /// Makes the next open-session calls wait until the returned handle is notified.
    pub fn hold_opens(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.open_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Makes the next confirmation calls wait until the returned handle is notified.
    pub fn hold_confirmations(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.confirm_gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl TelemetryTransport for RecordingTransport {
    async fn open_session(&self, request: StartSessionRequest) -> Result<SessionHandle> {
        self.lock().opens.push(request);
        let gate = self.open_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_open.load(Ordering::SeqCst) {
            bail!("NETWORK_ERROR: connection refused");
        }
        Ok(SessionHandle {
            id: SESSION_TOKEN.to_string(),
        })
    }

    async fn track_event(&self, request: TrackEventRequest) -> Result<()> {
        self.lock().events.push(request);
        Ok(())
    }

    async fn end_session(&self, request: EndSessionRequest) -> Result<()> {
        self.lock().ends.push(request);
        Ok(())
    }

    async fn create_confirmation(
        &self,
        page_slug: &str,
        request: CreateConfirmationRequest,
    ) -> Result<Confirmation> {
        self.lock()
            .confirmations
            .push((page_slug.to_string(), request.clone()));
        let gate = self.confirm_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_confirm.load(Ordering::SeqCst) {
            bail!("NETWORK_ERROR: connection refused");
        }
        Ok(Confirmation {
            id: format!("confirmation-{}", self.confirmation_calls()),
            followup_id: "followup-1".to_string(),
            session_id: request.session_id,
            kind: request.kind,
            confirmed_at: Utc::now(),
            comment: request.comment,
        })
    }
}

/// Headless host wiring shared by the integration tests.
pub struct Harness {
    pub platform: HeadlessPlatform,
    pub clock: ManualClock,
    pub transport: Arc<RecordingTransport>,
    pub tab_store: Arc<MemoryStore>,
    pub profile_store: Arc<MemoryStore>,
    pub dispatcher: Dispatcher,
}

impl Harness {
    /// Must be called from inside a tokio runtime.
    pub fn new() -> Self {
        Self {
            platform: HeadlessPlatform::default(),
            clock: ManualClock::new(1_000),
            transport: RecordingTransport::new(),
            tab_store: Arc::new(MemoryStore::new()),
            profile_store: Arc::new(MemoryStore::new()),
            dispatcher: Dispatcher::current().unwrap(),
        }
    }

    pub fn services(&self) -> PageServices {
        PageServices {
            platform: Arc::new(self.platform.clone()),
            clock: Arc::new(self.clock.clone()),
            transport: self.transport.clone(),
            tab_store: self.tab_store.clone(),
            profile_store: self.profile_store.clone(),
        }
    }

    pub fn engagement(&self) -> EngagementTracker {
        EngagementTracker::new(
            "session-1".to_string(),
            Arc::new(self.platform.clone()),
            self.transport.clone(),
            self.dispatcher.clone(),
        )
    }

    /// Engagement tracker with an open session plus a section tracker on top.
    pub async fn started_sections(&self) -> (EngagementTracker, SectionVisibilityTracker) {
        let engagement = self.engagement();
        engagement.start("followup-1").await;
        let sections = SectionVisibilityTracker::new(
            engagement.clone(),
            Arc::new(self.platform.clone()),
            Arc::new(self.clock.clone()),
            SectionTrackingOptions::default(),
        );
        (engagement, sections)
    }

    pub fn page(&self, slug: Option<&str>) -> FollowupPage {
        FollowupPage::new(
            "followup-1",
            slug,
            self.services(),
            TrackerSettings::default(),
            self.dispatcher.clone(),
        )
    }

    pub async fn settle(&self) {
        self.dispatcher.settle().await;
    }
}
