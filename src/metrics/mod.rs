//! Local bookkeeping of what happened to dispatched telemetry.
//!
//! Nothing here is reported upstream; it lets a host or a test see how many
//! data points were dropped without the trackers ever surfacing an error.

mod types;

pub use types::{DeliveryFailure, DeliverySnapshot};

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

const MAX_RECENT_FAILURES: usize = 20;

#[derive(Default)]
struct MetricsState {
    delivered: u64,
    failed: u64,
    skipped_no_session: u64,
    recent_failures: Vec<DeliveryFailure>,
}

#[derive(Clone, Default)]
pub struct DeliveryMetrics {
    inner: Arc<Mutex<MetricsState>>,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MetricsState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_delivered(&self) {
        self.state().delivered += 1;
    }

    pub fn record_failure(&self, label: &str, message: String) {
        let mut state = self.state();
        state.failed += 1;
        state.recent_failures.push(DeliveryFailure {
            timestamp: Utc::now(),
            label: label.to_string(),
            message,
        });

        if state.recent_failures.len() > MAX_RECENT_FAILURES {
            state.recent_failures.remove(0);
        }
    }

    /// An emission was dropped because no server session was open.
    pub fn record_skipped(&self) {
        self.state().skipped_no_session += 1;
    }

    pub fn snapshot(&self) -> DeliverySnapshot {
        let state = self.state();
        DeliverySnapshot {
            delivered: state.delivered,
            failed: state.failed,
            skipped_no_session: state.skipped_no_session,
            recent_failures: state.recent_failures.clone(),
        }
    }

    pub fn reset(&self) {
        *self.state() = MetricsState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_most_recent_failures() {
        let metrics = DeliveryMetrics::new();
        for i in 0..(MAX_RECENT_FAILURES + 5) {
            metrics.record_failure("track event", format!("boom {i}"));
        }
        metrics.record_delivered();
        metrics.record_skipped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.failed, (MAX_RECENT_FAILURES + 5) as u64);
        assert_eq!(snapshot.recent_failures.len(), MAX_RECENT_FAILURES);
        assert_eq!(snapshot.recent_failures[0].message, "boom 5");
        assert_eq!(snapshot.delivered, 1);
        assert_eq!(snapshot.skipped_no_session, 1);

        metrics.reset();
        assert_eq!(metrics.snapshot(), DeliverySnapshot::default());
    }
}
