/// Dwell-time bookkeeping for one section.
///
/// `started_at_ms` is set exactly while the section is in view. Time moves
/// into `total_ms` when the section leaves view; `reported_ms` is how much of
/// the total has already been sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionTimer {
    started_at_ms: Option<u64>,
    total_ms: u64,
    reported_ms: u64,
}

impl SectionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    /// Returns `false` if the timer was already running.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.started_at_ms.is_some() {
            return false;
        }
        self.started_at_ms = Some(now_ms);
        true
    }

    /// Stops the timer and returns the time added by the interval just closed.
    pub fn stop(&mut self, now_ms: u64) -> u64 {
        let Some(started_at) = self.started_at_ms.take() else {
            return 0;
        };
        let elapsed = now_ms.saturating_sub(started_at);
        self.total_ms = self.total_ms.saturating_add(elapsed);
        elapsed
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    /// Accumulated time including the interval still running.
    pub fn effective_ms(&self, now_ms: u64) -> u64 {
        match self.started_at_ms {
            Some(started_at) => self
                .total_ms
                .saturating_add(now_ms.saturating_sub(started_at)),
            None => self.total_ms,
        }
    }

    pub fn unreported_ms(&self, now_ms: u64) -> u64 {
        self.effective_ms(now_ms).saturating_sub(self.reported_ms)
    }

    /// Claims the unreported time once the section's total dwell reaches
    /// `min_ms`. Claimed time is never handed out again.
    pub fn take_report(&mut self, now_ms: u64, min_ms: u64) -> Option<u64> {
        if self.effective_ms(now_ms) < min_ms {
            return None;
        }
        let unreported = self.unreported_ms(now_ms);
        if unreported == 0 {
            return None;
        }
        self.reported_ms = self.reported_ms.saturating_add(unreported);
        Some(unreported)
    }
}
