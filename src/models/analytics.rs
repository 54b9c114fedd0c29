//! Analytics wire types shared with the backend.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "MOBILE",
            DeviceType::Tablet => "TABLET",
            DeviceType::Desktop => "DESKTOP",
        }
    }
}

/// Kind of engagement event. Unknown names travel as [`EventType::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    PageView,
    SectionView,
    SectionTime,
    ScrollDepth,
    FileDownload,
    LinkClick,
    CopyEmail,
    CopyPhone,
    Custom(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::PageView => "PAGE_VIEW",
            EventType::SectionView => "SECTION_VIEW",
            EventType::SectionTime => "SECTION_TIME",
            EventType::ScrollDepth => "SCROLL_DEPTH",
            EventType::FileDownload => "FILE_DOWNLOAD",
            EventType::LinkClick => "LINK_CLICK",
            EventType::CopyEmail => "COPY_EMAIL",
            EventType::CopyPhone => "COPY_PHONE",
            EventType::Custom(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "PAGE_VIEW" => EventType::PageView,
            "SECTION_VIEW" => EventType::SectionView,
            "SECTION_TIME" => EventType::SectionTime,
            "SCROLL_DEPTH" => EventType::ScrollDepth,
            "FILE_DOWNLOAD" => EventType::FileDownload,
            "LINK_CLICK" => EventType::LinkClick,
            "COPY_EMAIL" => EventType::CopyEmail,
            "COPY_PHONE" => EventType::CopyPhone,
            other => EventType::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(EventType::from_name(&name))
    }
}

/// Fixed set of instrumented page regions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum SectionId {
    MeetingRecap,
    ValueProposition,
    NextSteps,
}

impl SectionId {
    pub const ALL: [SectionId; 3] = [
        SectionId::MeetingRecap,
        SectionId::ValueProposition,
        SectionId::NextSteps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::MeetingRecap => "meeting-recap",
            SectionId::ValueProposition => "value-proposition",
            SectionId::NextSteps => "next-steps",
        }
    }

    /// Section id without separators, reported as `sectionType`.
    pub fn section_type(&self) -> String {
        self.as_str().replace('-', "")
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device class and browser family sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub device_type: DeviceType,
    pub browser: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[serde(rename = "followupId")]
    pub page_id: String,
    pub device_type: DeviceType,
    pub browser: String,
}

/// Server-side tracking session. `id` is the token every later event carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionHandle {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    #[serde(rename = "followupId")]
    pub page_id: String,
    #[serde(rename = "sessionId")]
    pub session_token: String,
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_data: Option<serde_json::Value>,
    pub device_type: DeviceType,
    pub browser: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    #[serde(rename = "sessionId")]
    pub session_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionViewData {
    pub section_id: SectionId,
    pub section_type: String,
    pub section_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionTimeData {
    pub section_id: SectionId,
    pub time_spent_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrollDepthData {
    pub scroll_depth_percent: u32,
    pub max_scroll_depth_percent: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkClickData {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
    /// Free-form location of the link, e.g. `header` or a section id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileDownloadData {
    pub file_id: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CopyData {
    /// Copied email or phone; the backend hashes it.
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
}

/// Dashboard window for the metric read endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::Quarter => "90d",
            TimeRange::All => "all",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackBreakdown {
    pub positive: u64,
    pub negative: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackSummary {
    pub recap: FeedbackBreakdown,
    pub value_proposition: FeedbackBreakdown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionEngagement {
    pub section_name: String,
    pub total_time_spent: u64,
    pub view_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkClickCount {
    pub url: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InterestSignals {
    pub interested_count: u64,
    pub schedule_call_count: u64,
    pub total_interest: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceBreakdown {
    pub mobile: u64,
    pub tablet: u64,
    pub desktop: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationCount {
    pub city: String,
    pub country: String,
    pub count: u64,
}

/// Aggregates produced by the backend for one follow-up page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FollowupAnalytics {
    #[serde(rename = "followupId")]
    pub page_id: String,
    pub unique_visitors: u64,
    pub total_page_views: u64,
    /// Seconds.
    pub average_time_on_page: u64,
    pub feedback: FeedbackSummary,
    pub section_engagement: Vec<SectionEngagement>,
    pub link_clicks: Vec<LinkClickCount>,
    pub interest_signals: InterestSignals,
    pub device_breakdown: DeviceBreakdown,
    pub top_locations: Vec<LocationCount>,
}
