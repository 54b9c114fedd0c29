use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryFailure {
    pub timestamp: DateTime<Utc>,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySnapshot {
    pub delivered: u64,
    pub failed: u64,
    pub skipped_no_session: u64,
    pub recent_failures: Vec<DeliveryFailure>,
}
