//! Engagement tracking for published follow-up pages.
//!
//! A [`FollowupPage`] composes three independent pieces that all report
//! through one [`TelemetryTransport`]:
//! - [`EngagementTracker`]: the view session and generic events,
//! - [`SectionVisibilityTracker`]: section views, dwell time and scroll depth,
//! - [`ConfirmationLedger`]: one-shot micro-commitments, deduplicated locally.
//!
//! Nothing here surfaces telemetry failures to the page. They are logged and
//! counted in [`DeliveryMetrics`].

mod utils;

pub mod confirmations;
pub mod metrics;
pub mod models;
pub mod page;
pub mod platform;
pub mod session;
pub mod settings;
pub mod storage;
pub mod tracker;
pub mod transport;

pub use confirmations::{ConfirmationLedger, Feedback};
pub use metrics::DeliveryMetrics;
pub use page::{FollowupPage, PageServices};
pub use session::SessionIdentity;
pub use settings::{SettingsStore, TrackerSettings};
pub use tracker::{EngagementTracker, SectionVisibilityTracker};
pub use transport::{Dispatcher, HttpTransport, TelemetryTransport};
pub use utils::logging::init_logging;
