//! One-shot micro-commitment prompts and their local ledger.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{Context, Result};
use tokio::time::Instant;

use crate::{
    models::{ConfirmationType, CreateConfirmationRequest},
    storage::KeyValueStore,
    transport::TelemetryTransport,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const STORAGE_KEY_PREFIX: &str = "followup_confirmations_";

/// Bucket for one (page, session) pair. Without a session id every visit to
/// the page shares the slug-only bucket.
pub fn storage_key(page_slug: &str, session_id: Option<&str>) -> String {
    match session_id.filter(|id| !id.is_empty()) {
        Some(session_id) => format!("{STORAGE_KEY_PREFIX}{page_slug}_{session_id}"),
        None => format!("{STORAGE_KEY_PREFIX}{page_slug}"),
    }
}

/// Acknowledgement shown to the visitor after a confirmation went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    pub kind: ConfirmationType,
    pub message: &'static str,
}

#[derive(Debug, Default)]
struct LedgerState {
    /// Keyed by wire name so kinds this build does not know survive a rewrite.
    confirmations: BTreeMap<String, bool>,
    submitting: Option<ConfirmationType>,
    feedback: Option<(Feedback, Instant)>,
}

/// Persisted map of confirmation kind to "already answered".
///
/// A kind is marked the moment it is submitted, before the network call
/// resolves, and stays marked when the call fails. Later submissions of the
/// same kind in the same bucket never reach the network.
#[derive(Clone)]
pub struct ConfirmationLedger {
    page_slug: Option<Arc<str>>,
    session_id: Option<Arc<str>>,
    store: Arc<dyn KeyValueStore>,
    transport: Arc<dyn TelemetryTransport>,
    feedback_ttl: Duration,
    state: Arc<Mutex<LedgerState>>,
}

impl ConfirmationLedger {
    /// Reads back whatever was persisted for the derived key. Missing or
    /// unreadable data starts an empty ledger.
    pub fn load(
        page_slug: Option<&str>,
        session_id: Option<&str>,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn TelemetryTransport>,
        feedback_ttl: Duration,
    ) -> Self {
        let page_slug: Option<Arc<str>> = page_slug.filter(|slug| !slug.is_empty()).map(Into::into);
        let session_id: Option<Arc<str>> = session_id.filter(|id| !id.is_empty()).map(Into::into);

        let confirmations = match page_slug.as_deref() {
            Some(slug) => {
                let key = storage_key(slug, session_id.as_deref());
                match read_confirmations(store.as_ref(), &key) {
                    Ok(confirmations) => confirmations,
                    Err(err) => {
                        log_warn!("ignoring stored confirmations under {key}: {err:#}");
                        BTreeMap::new()
                    }
                }
            }
            None => BTreeMap::new(),
        };

        Self {
            page_slug,
            session_id,
            store,
            transport,
            feedback_ttl,
            state: Arc::new(Mutex::new(LedgerState {
                confirmations,
                ..LedgerState::default()
            })),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn storage_key(&self) -> Option<String> {
        self.page_slug
            .as_deref()
            .map(|slug| storage_key(slug, self.session_id.as_deref()))
    }

    /// Records the visitor's answer and sends it to the backend.
    ///
    /// Returns `false` without touching the network when there is no page
    /// slug or `kind` is already confirmed. Otherwise returns whether the
    /// backend accepted it; the kind stays confirmed either way.
    pub async fn submit(&self, kind: ConfirmationType, comment: Option<String>) -> bool {
        let Some(page_slug) = self.page_slug.clone() else {
            return false;
        };

        {
            let mut state = self.lock_state();
            if state.confirmations.get(kind.as_str()).copied().unwrap_or(false) {
                return false;
            }
            state.confirmations.insert(kind.as_str().to_string(), true);
            state.submitting = Some(kind);
            state.feedback = None;
            if let Err(err) = self.persist(&state.confirmations) {
                log_warn!("confirmation {kind} kept in memory only: {err:#}");
            }
        }

        let request = CreateConfirmationRequest {
            kind,
            session_id: self.session_id.as_deref().map(str::to_string),
            comment,
        };
        let outcome = self.transport.create_confirmation(&page_slug, request).await;

        let mut state = self.lock_state();
        if state.submitting == Some(kind) {
            state.submitting = None;
        }
        match outcome {
            Ok(confirmation) => {
                log_info!("confirmation {} recorded as {}", kind, confirmation.id);
                state.feedback = Some((
                    Feedback {
                        kind,
                        message: kind.feedback_message(),
                    },
                    Instant::now(),
                ));
                true
            }
            Err(err) => {
                log_error!("Failed to submit confirmation {kind}: {err:#}");
                false
            }
        }
    }

    fn persist(&self, confirmations: &BTreeMap<String, bool>) -> Result<()> {
        let Some(key) = self.storage_key() else {
            return Ok(());
        };
        let encoded =
            serde_json::to_string(confirmations).context("failed to encode confirmations")?;
        self.store.set(&key, &encoded)
    }

    pub fn has_confirmed(&self, kind: ConfirmationType) -> bool {
        self.lock_state()
            .confirmations
            .get(kind.as_str())
            .copied()
            .unwrap_or(false)
    }

    fn has_any(&self, kinds: &[ConfirmationType]) -> bool {
        let state = self.lock_state();
        kinds
            .iter()
            .any(|kind| state.confirmations.get(kind.as_str()).copied().unwrap_or(false))
    }

    pub fn has_recap_confirmation(&self) -> bool {
        self.has_any(&[
            ConfirmationType::RecapAccurate,
            ConfirmationType::RecapInaccurate,
        ])
    }

    pub fn has_value_prop_confirmation(&self) -> bool {
        self.has_any(&[
            ConfirmationType::ValuePropClear,
            ConfirmationType::ValuePropUnclear,
        ])
    }

    pub fn has_interest_confirmation(&self) -> bool {
        self.has_any(&[ConfirmationType::Interested, ConfirmationType::ScheduleCall])
    }

    /// Kind whose submission is still waiting on the backend.
    pub fn submitting(&self) -> Option<ConfirmationType> {
        self.lock_state().submitting
    }

    /// Latest acknowledgement, until it is older than the feedback TTL.
    pub fn feedback(&self) -> Option<Feedback> {
        let state = self.lock_state();
        let (feedback, shown_at) = state.feedback?;
        (shown_at.elapsed() < self.feedback_ttl).then_some(feedback)
    }
}

fn read_confirmations(store: &dyn KeyValueStore, key: &str) -> Result<BTreeMap<String, bool>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).context("stored confirmations are not a JSON map"),
        None => Ok(BTreeMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn storage_key_uses_session_when_present() {
        assert_eq!(
            storage_key("acme-q3", Some("abc")),
            "followup_confirmations_acme-q3_abc"
        );
        assert_eq!(storage_key("acme-q3", None), "followup_confirmations_acme-q3");
        assert_eq!(storage_key("acme-q3", Some("")), "followup_confirmations_acme-q3");
    }

    #[test]
    fn read_confirmations_keeps_unknown_kinds() {
        let store = MemoryStore::new();
        store
            .set("k", r#"{"RECAP_ACCURATE":true,"LEGACY_KIND":true}"#)
            .unwrap();

        let confirmations = read_confirmations(&store, "k").unwrap();
        assert_eq!(confirmations.len(), 2);
        assert_eq!(confirmations.get("LEGACY_KIND"), Some(&true));
    }

    #[test]
    fn read_confirmations_rejects_garbage() {
        let store = MemoryStore::new();
        store.set("k", "not json").unwrap();
        assert!(read_confirmations(&store, "k").is_err());
        assert!(read_confirmations(&store, "missing").unwrap().is_empty());
    }
}
