use std::{future::Future, time::Duration};

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::metrics::DeliveryMetrics;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_warn};

/// Fire-and-forget executor for telemetry calls.
///
/// Every call runs as a detached task; callers never await the result. The
/// tracker keeps count of what is in flight so teardown can wait for it with
/// a bound instead of losing it.
#[derive(Clone)]
pub struct Dispatcher {
    tasks: TaskTracker,
    cancel_token: CancellationToken,
    runtime: Handle,
    metrics: DeliveryMetrics,
}

impl Dispatcher {
    pub fn new(runtime: Handle) -> Self {
        Self {
            tasks: TaskTracker::new(),
            cancel_token: CancellationToken::new(),
            runtime,
            metrics: DeliveryMetrics::new(),
        }
    }

    /// Dispatcher bound to the runtime the caller is running on.
    pub fn current() -> Result<Self> {
        let runtime = Handle::try_current().context("telemetry dispatch needs a tokio runtime")?;
        Ok(Self::new(runtime))
    }

    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    /// Number of calls still in flight.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Run `call` in the background. It is abandoned if teardown runs out of time.
    pub fn dispatch<F>(&self, label: &'static str, call: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let cancel_token = self.cancel_token.clone();
        let metrics = self.metrics.clone();
        self.tasks.spawn_on(
            async move {
                tokio::select! {
                    result = call => record_outcome(&metrics, label, result),
                    _ = cancel_token.cancelled() => {
                        log_warn!("{label} abandoned during teardown");
                        metrics.record_failure(label, "abandoned during teardown".into());
                    }
                }
            },
            &self.runtime,
        );
    }

    /// Run `call` in the background and never cancel it, even after
    /// [`Dispatcher::shutdown`] gives up waiting.
    pub fn dispatch_unload_safe<F>(&self, label: &'static str, call: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let metrics = self.metrics.clone();
        self.tasks.spawn_on(
            async move { record_outcome(&metrics, label, call.await) },
            &self.runtime,
        );
    }

    /// Wait for everything currently in flight to finish.
    pub async fn settle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Wait up to `timeout` for in-flight calls. Returns `false` when the wait
    /// ran out; cancellable calls are then abandoned while unload-safe ones
    /// keep running detached.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tasks.close();
        match tokio::time::timeout(timeout, self.tasks.wait()).await {
            Ok(()) => {
                log_debug!("telemetry drained before teardown");
                true
            }
            Err(_) => {
                log_warn!(
                    "{} telemetry call(s) still in flight after {}ms; abandoning",
                    self.tasks.len(),
                    timeout.as_millis()
                );
                self.cancel_token.cancel();
                false
            }
        }
    }
}

fn record_outcome(metrics: &DeliveryMetrics, label: &'static str, result: Result<()>) {
    match result {
        Ok(()) => metrics.record_delivered(),
        Err(err) => {
            log_error!("Failed to {label}: {err:#}");
            metrics.record_failure(label, format!("{err:#}"));
        }
    }
}
