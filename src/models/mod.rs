pub mod analytics;
pub mod api;
pub mod confirmation;

pub use analytics::{
    ClientInfo, CopyData, DeviceType, EndSessionRequest, EventType, FileDownloadData,
    FollowupAnalytics, LinkClickData, ScrollDepthData, SectionId, SectionTimeData,
    SectionViewData, SessionHandle, StartSessionRequest, TimeRange, TrackEventRequest,
};
pub use api::{ApiError, ApiResponse};
pub use confirmation::{
    Confirmation, ConfirmationMetrics, ConfirmationType, CreateConfirmationRequest,
};
