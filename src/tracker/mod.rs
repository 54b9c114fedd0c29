pub mod device;
pub mod engagement;
pub mod scroll;
pub mod sections;
pub mod timer;

pub use engagement::EngagementTracker;
pub use scroll::{FrameThrottle, ScrollProgress, SCROLL_MILESTONES};
pub use sections::{SectionTrackingOptions, SectionVisibilityTracker};
pub use timer::SectionTimer;
