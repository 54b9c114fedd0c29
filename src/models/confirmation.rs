//! Micro-commitment confirmation types.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationType {
    /// "Is this recap accurate?" - yes.
    RecapAccurate,
    /// "Is this recap accurate?" - something's off.
    RecapInaccurate,
    /// "Does this resonate?" - yes.
    ValuePropClear,
    /// "Does this resonate?" - tell me more.
    ValuePropUnclear,
    Interested,
    ScheduleCall,
}

impl ConfirmationType {
    pub const ALL: [ConfirmationType; 6] = [
        ConfirmationType::RecapAccurate,
        ConfirmationType::RecapInaccurate,
        ConfirmationType::ValuePropClear,
        ConfirmationType::ValuePropUnclear,
        ConfirmationType::Interested,
        ConfirmationType::ScheduleCall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationType::RecapAccurate => "RECAP_ACCURATE",
            ConfirmationType::RecapInaccurate => "RECAP_INACCURATE",
            ConfirmationType::ValuePropClear => "VALUE_PROP_CLEAR",
            ConfirmationType::ValuePropUnclear => "VALUE_PROP_UNCLEAR",
            ConfirmationType::Interested => "INTERESTED",
            ConfirmationType::ScheduleCall => "SCHEDULE_CALL",
        }
    }

    /// Message shown to the visitor after a successful submission.
    pub fn feedback_message(&self) -> &'static str {
        match self {
            ConfirmationType::RecapAccurate => "Thanks for confirming!",
            ConfirmationType::RecapInaccurate => "We'll review this. Thanks for the feedback!",
            ConfirmationType::ValuePropClear => "Great! Glad it resonates.",
            ConfirmationType::ValuePropUnclear => "We'll follow up with more details.",
            ConfirmationType::Interested => "Wonderful! We look forward to connecting.",
            ConfirmationType::ScheduleCall => "Taking you to schedule...",
        }
    }
}

impl fmt::Display for ConfirmationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of the create-confirmation call; the page slug travels in the path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateConfirmationRequest {
    #[serde(rename = "type")]
    pub kind: ConfirmationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub id: String,
    pub followup_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: ConfirmationType,
    pub confirmed_at: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Dashboard view of the confirmations recorded for one follow-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfirmationMetrics {
    pub followup_id: String,
    pub total: u64,
    pub by_type: BTreeMap<ConfirmationType, u64>,
    pub recap_accuracy_rate: Option<f64>,
    pub value_prop_resonance_rate: Option<f64>,
    pub interest_rate: Option<f64>,
    pub recent_confirmations: Vec<Confirmation>,
}
