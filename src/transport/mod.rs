//! Outbound side of the trackers: the backend contract and how calls are
//! dispatched without ever blocking the page.

mod dispatch;
mod http;

pub use dispatch::Dispatcher;
pub use http::HttpTransport;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{
    Confirmation, ConfirmationMetrics, CreateConfirmationRequest, EndSessionRequest,
    FollowupAnalytics, SessionHandle, StartSessionRequest, TimeRange, TrackEventRequest,
};

/// Backend calls the trackers and the ledger depend on.
///
/// The read endpoints are only used by dashboards; transports that exist
/// purely for delivery can keep the default implementations.
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    async fn open_session(&self, request: StartSessionRequest) -> Result<SessionHandle>;

    async fn track_event(&self, request: TrackEventRequest) -> Result<()>;

    /// Must stay deliverable while the page is going away; callers dispatch it
    /// through [`Dispatcher::dispatch_unload_safe`].
    async fn end_session(&self, request: EndSessionRequest) -> Result<()>;

    async fn create_confirmation(
        &self,
        page_slug: &str,
        request: CreateConfirmationRequest,
    ) -> Result<Confirmation>;

    async fn fetch_followup_analytics(
        &self,
        page_id: &str,
        range: TimeRange,
    ) -> Result<FollowupAnalytics> {
        let _ = (page_id, range);
        bail!("this transport does not serve analytics reads")
    }

    async fn fetch_confirmation_metrics(&self, page_id: &str) -> Result<ConfirmationMetrics> {
        let _ = page_id;
        bail!("this transport does not serve confirmation metrics")
    }
}
