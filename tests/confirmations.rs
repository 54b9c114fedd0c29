mod common;

use std::{sync::Arc, time::Duration};

use common::RecordingTransport;
use followup_engagement::{
    confirmations::{storage_key, ConfirmationLedger, Feedback},
    models::ConfirmationType,
    storage::{KeyValueStore, MemoryStore},
};

const TTL: Duration = Duration::from_secs(3);

fn ledger(
    store: &Arc<MemoryStore>,
    transport: &Arc<RecordingTransport>,
    slug: Option<&str>,
    session_id: Option<&str>,
) -> ConfirmationLedger {
    ConfirmationLedger::load(slug, session_id, store.clone(), transport.clone(), TTL)
}

#[tokio::test]
async fn second_submit_of_same_kind_is_a_no_op() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    let ledger = ledger(&store, &transport, Some("acme-q3"), Some("session-a"));

    assert!(ledger.submit(ConfirmationType::RecapAccurate, None).await);
    assert!(!ledger.submit(ConfirmationType::RecapAccurate, None).await);

    assert_eq!(transport.confirmation_calls(), 1);
    let (slug, request) = &transport.recorded().confirmations[0];
    assert_eq!(slug, "acme-q3");
    assert_eq!(request.kind, ConfirmationType::RecapAccurate);
    assert_eq!(request.session_id.as_deref(), Some("session-a"));
}

#[tokio::test]
async fn marked_confirmed_while_request_is_pending() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    let ledger = ledger(&store, &transport, Some("acme-q3"), Some("session-a"));
    let gate = transport.hold_confirmations();

    let pending = tokio::spawn({
        let ledger = ledger.clone();
        async move { ledger.submit(ConfirmationType::RecapAccurate, None).await }
    });
    while transport.confirmation_calls() == 0 {
        tokio::task::yield_now().await;
    }

    assert!(ledger.has_confirmed(ConfirmationType::RecapAccurate));
    assert_eq!(ledger.submitting(), Some(ConfirmationType::RecapAccurate));
    assert!(!ledger.submit(ConfirmationType::RecapAccurate, None).await);
    assert_eq!(transport.confirmation_calls(), 1);

    gate.notify_one();
    assert!(pending.await.unwrap());
    assert_eq!(ledger.submitting(), None);
}

#[tokio::test]
async fn failed_submission_stays_confirmed_and_persisted() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    transport.set_fail_confirm(true);
    let ledger = ledger(&store, &transport, Some("acme-q3"), Some("session-a"));

    assert!(!ledger.submit(ConfirmationType::Interested, None).await);

    assert!(ledger.has_confirmed(ConfirmationType::Interested));
    assert_eq!(ledger.feedback(), None);
    let stored = store
        .get("followup_confirmations_acme-q3_session-a")
        .unwrap()
        .unwrap();
    let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored, serde_json::json!({ "INTERESTED": true }));

    // A retried prompt does not reach the network again.
    transport.set_fail_confirm(false);
    assert!(!ledger.submit(ConfirmationType::Interested, None).await);
    assert_eq!(transport.confirmation_calls(), 1);
}

#[tokio::test]
async fn sessions_get_independent_buckets() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    let session_a = ledger(&store, &transport, Some("acme-q3"), Some("session-a"));
    let session_b = ledger(&store, &transport, Some("acme-q3"), Some("session-b"));

    session_a.submit(ConfirmationType::RecapAccurate, None).await;

    assert!(session_a.has_confirmed(ConfirmationType::RecapAccurate));
    assert!(!session_b.has_confirmed(ConfirmationType::RecapAccurate));
    assert!(store.get(&storage_key("acme-q3", Some("session-a"))).unwrap().is_some());
    assert!(store.get(&storage_key("acme-q3", Some("session-b"))).unwrap().is_none());

    assert!(session_b.submit(ConfirmationType::RecapAccurate, None).await);
    assert_eq!(transport.confirmation_calls(), 2);
}

#[tokio::test]
async fn group_checks_or_their_pairs() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    let ledger = ledger(&store, &transport, Some("acme-q3"), Some("session-a"));

    ledger.submit(ConfirmationType::ValuePropUnclear, None).await;

    assert!(ledger.has_value_prop_confirmation());
    assert!(!ledger.has_recap_confirmation());
    assert!(!ledger.has_interest_confirmation());

    ledger.submit(ConfirmationType::ScheduleCall, None).await;
    assert!(ledger.has_interest_confirmation());
}

#[tokio::test]
async fn reload_restores_the_persisted_bucket() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    ledger(&store, &transport, Some("acme-q3"), Some("session-a"))
        .submit(ConfirmationType::RecapInaccurate, Some("Pricing was off".into()))
        .await;

    let reloaded = ledger(&store, &transport, Some("acme-q3"), Some("session-a"));
    assert!(reloaded.has_recap_confirmation());
    assert!(!reloaded.submit(ConfirmationType::RecapInaccurate, None).await);
    assert_eq!(transport.confirmation_calls(), 1);
    assert_eq!(
        transport.recorded().confirmations[0].1.comment.as_deref(),
        Some("Pricing was off")
    );
}

#[tokio::test]
async fn missing_session_falls_back_to_slug_bucket() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    let first = ledger(&store, &transport, Some("acme-q3"), None);
    assert_eq!(first.storage_key().as_deref(), Some("followup_confirmations_acme-q3"));

    first.submit(ConfirmationType::ValuePropClear, None).await;
    assert_eq!(transport.recorded().confirmations[0].1.session_id, None);

    let second = ledger(&store, &transport, Some("acme-q3"), Some(""));
    assert!(second.has_confirmed(ConfirmationType::ValuePropClear));
}

#[tokio::test]
async fn corrupt_storage_reads_as_empty_and_keeps_unknown_kinds_on_write() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    let key = storage_key("acme-q3", Some("session-a"));

    store.set(&key, "{not json").unwrap();
    let ledger_from_garbage = ledger(&store, &transport, Some("acme-q3"), Some("session-a"));
    assert!(!ledger_from_garbage.has_recap_confirmation());

    store.set(&key, r#"{"LEGACY_KIND":true}"#).unwrap();
    let ledger = ledger(&store, &transport, Some("acme-q3"), Some("session-a"));
    ledger.submit(ConfirmationType::RecapAccurate, None).await;

    let stored: serde_json::Value =
        serde_json::from_str(&store.get(&key).unwrap().unwrap()).unwrap();
    assert_eq!(
        stored,
        serde_json::json!({ "LEGACY_KIND": true, "RECAP_ACCURATE": true })
    );
}

#[tokio::test]
async fn without_a_slug_nothing_is_sent_or_stored() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    let ledger = ledger(&store, &transport, None, Some("session-a"));

    assert!(!ledger.submit(ConfirmationType::Interested, None).await);

    assert_eq!(transport.confirmation_calls(), 0);
    assert!(!ledger.has_confirmed(ConfirmationType::Interested));
    assert!(store.is_empty());
    assert_eq!(ledger.storage_key(), None);
}

#[tokio::test(start_paused = true)]
async fn feedback_message_expires() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    let ledger = ledger(&store, &transport, Some("acme-q3"), Some("session-a"));

    ledger.submit(ConfirmationType::ValuePropClear, None).await;
    assert_eq!(
        ledger.feedback(),
        Some(Feedback {
            kind: ConfirmationType::ValuePropClear,
            message: "Great! Glad it resonates.",
        })
    );

    tokio::time::advance(Duration::from_millis(2_900)).await;
    assert!(ledger.feedback().is_some());

    tokio::time::advance(Duration::from_millis(200)).await;
    assert_eq!(ledger.feedback(), None);
}

#[tokio::test]
async fn new_submission_clears_previous_feedback() {
    let store = Arc::new(MemoryStore::new());
    let transport = RecordingTransport::new();
    let ledger = ledger(&store, &transport, Some("acme-q3"), Some("session-a"));

    ledger.submit(ConfirmationType::RecapAccurate, None).await;
    assert_eq!(
        ledger.feedback().map(|feedback| feedback.kind),
        Some(ConfirmationType::RecapAccurate)
    );

    let gate = transport.hold_confirmations();
    let pending = tokio::spawn({
        let ledger = ledger.clone();
        async move { ledger.submit(ConfirmationType::Interested, None).await }
    });
    while transport.confirmation_calls() < 2 {
        tokio::task::yield_now().await;
    }
    assert_eq!(ledger.feedback(), None);

    gate.notify_one();
    assert!(pending.await.unwrap());
    assert_eq!(
        ledger.feedback().map(|feedback| feedback.kind),
        Some(ConfirmationType::Interested)
    );
}
