use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;

use crate::{
    models::{
        ClientInfo, CopyData, EndSessionRequest, EventType, FileDownloadData, LinkClickData,
        ScrollDepthData, SectionId, SectionTimeData, SectionViewData, StartSessionRequest,
        TrackEventRequest,
    },
    platform::Platform,
    transport::{Dispatcher, TelemetryTransport},
};

use super::device::client_info;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

#[derive(Debug, Default)]
struct EngagementState {
    page_id: Option<String>,
    session_token: Option<String>,
    /// Set while an open-session call is in flight or has succeeded.
    open_requested: bool,
    ended: bool,
}

/// Owns the one server-side view session of a mounted page and emits events
/// into it.
///
/// Every emission is fire-and-forget: it is a no-op without a session token,
/// and failures are logged and counted, never returned.
#[derive(Clone)]
pub struct EngagementTracker {
    state: Arc<Mutex<EngagementState>>,
    session_id: Arc<str>,
    platform: Arc<dyn Platform>,
    transport: Arc<dyn TelemetryTransport>,
    dispatcher: Dispatcher,
}

impl EngagementTracker {
    pub fn new(
        session_id: String,
        platform: Arc<dyn Platform>,
        transport: Arc<dyn TelemetryTransport>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(EngagementState::default())),
            session_id: session_id.into(),
            platform,
            transport,
            dispatcher,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EngagementState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Tab-scoped visitor id this tracker was created with.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Token of the open server session, if the open call succeeded.
    pub fn session_token(&self) -> Option<String> {
        self.lock_state().session_token.clone()
    }

    pub fn page_id(&self) -> Option<String> {
        self.lock_state().page_id.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn client_info(&self) -> ClientInfo {
        client_info(self.platform.as_ref())
    }

    /// Opens the view session for `page_id` and records the page view.
    ///
    /// Does nothing while a previous call is in flight or has succeeded. A
    /// failed open leaves every later emission a no-op until `start` runs again.
    pub async fn start(&self, page_id: &str) {
        if page_id.is_empty() {
            return;
        }

        {
            let mut state = self.lock_state();
            if state.open_requested {
                log_debug!("tracking session already requested for page {page_id}");
                return;
            }
            state.open_requested = true;
            state.page_id = Some(page_id.to_string());
        }

        let client = self.client_info();
        let request = StartSessionRequest {
            page_id: page_id.to_string(),
            device_type: client.device_type,
            browser: client.browser,
        };

        match self.transport.open_session(request).await {
            Ok(handle) => {
                log_info!("tracking session {} opened for page {}", handle.id, page_id);
                {
                    let mut state = self.lock_state();
                    state.session_token = Some(handle.id);
                    state.ended = false;
                }
                self.emit(EventType::PageView, None);
            }
            Err(err) => {
                log_error!("Failed to open tracking session for page {page_id}: {err:#}");
                self.lock_state().open_requested = false;
            }
        }
    }

    /// Sends one event. Returns immediately; delivery happens in the background.
    pub fn emit(&self, event_type: EventType, event_data: Option<Value>) {
        let target = {
            let state = self.lock_state();
            state.page_id.clone().zip(state.session_token.clone())
        };
        let Some((page_id, session_token)) = target else {
            log_debug!("dropping {event_type}: no tracking session");
            self.dispatcher.metrics().record_skipped();
            return;
        };

        let client = self.client_info();
        let request = TrackEventRequest {
            page_id,
            session_token,
            event_type,
            event_data,
            device_type: client.device_type,
            browser: client.browser,
        };

        let transport = self.transport.clone();
        self.dispatcher
            .dispatch("track event", async move { transport.track_event(request).await });
    }

    fn emit_payload<T: Serialize>(&self, event_type: EventType, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(data) => self.emit(event_type, Some(data)),
            Err(err) => log_error!("Failed to encode {event_type} payload: {err}"),
        }
    }

    pub fn track_link_click(&self, url: &str, link_text: Option<&str>, section_id: Option<&str>) {
        self.emit_payload(
            EventType::LinkClick,
            &LinkClickData {
                url: url.to_string(),
                link_text: link_text.map(str::to_string),
                section_id: section_id.map(str::to_string),
            },
        );
    }

    pub fn track_section_view(&self, section_id: SectionId, section_title: &str) {
        self.emit_payload(
            EventType::SectionView,
            &SectionViewData {
                section_id,
                section_type: section_id.section_type(),
                section_title: section_title.to_string(),
            },
        );
    }

    pub fn track_section_time(&self, section_id: SectionId, time_spent_ms: u64) {
        self.emit_payload(
            EventType::SectionTime,
            &SectionTimeData {
                section_id,
                time_spent_ms,
            },
        );
    }

    pub fn track_scroll_depth(&self, scroll_depth_percent: u32, max_scroll_depth_percent: u32) {
        self.emit_payload(
            EventType::ScrollDepth,
            &ScrollDepthData {
                scroll_depth_percent,
                max_scroll_depth_percent,
            },
        );
    }

    pub fn track_file_download(&self, file_id: &str, filename: &str) {
        self.emit_payload(
            EventType::FileDownload,
            &FileDownloadData {
                file_id: file_id.to_string(),
                filename: filename.to_string(),
            },
        );
    }

    /// `event_type` is expected to be [`EventType::CopyEmail`] or [`EventType::CopyPhone`].
    pub fn track_copy(&self, event_type: EventType, value: &str, contact_id: Option<&str>) {
        self.emit_payload(
            event_type,
            &CopyData {
                value: value.to_string(),
                contact_id: contact_id.map(str::to_string),
            },
        );
    }

    /// Page is going away: ends the server session through the unload-safe
    /// path. Only the first call after a successful open sends anything.
    pub fn page_hide(&self) {
        let session_token = {
            let mut state = self.lock_state();
            if state.ended {
                return;
            }
            let Some(token) = state.session_token.clone() else {
                return;
            };
            state.ended = true;
            token
        };

        log_debug!("ending tracking session {session_token}");
        let transport = self.transport.clone();
        self.dispatcher.dispatch_unload_safe("end session", async move {
            transport
                .end_session(EndSessionRequest { session_token })
                .await
        });
    }
}
