/// Scroll-depth checkpoints, in ascending order.
pub const SCROLL_MILESTONES: [u32; 4] = [25, 50, 75, 100];

/// Deepest scroll position seen and the highest milestone already sent.
/// Neither value ever decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollProgress {
    max_depth_percent: u32,
    last_reported_milestone: u32,
}

impl ScrollProgress {
    pub fn max_depth_percent(&self) -> u32 {
        self.max_depth_percent
    }

    pub fn last_reported_milestone(&self) -> u32 {
        self.last_reported_milestone
    }

    /// Folds in a new position. Returns the milestone to report, if any; at
    /// most one per call, lowest first.
    pub fn record(&mut self, current_percent: u32) -> Option<u32> {
        self.max_depth_percent = self.max_depth_percent.max(current_percent);

        let milestone = SCROLL_MILESTONES.into_iter().find(|&m| {
            self.max_depth_percent >= m && self.last_reported_milestone < m
        })?;
        self.last_reported_milestone = milestone;
        Some(milestone)
    }

    /// Depth that has not been reported by any milestone yet, claimed for a
    /// final report at unload.
    pub fn take_final(&mut self) -> Option<u32> {
        if self.max_depth_percent <= self.last_reported_milestone {
            return None;
        }
        self.last_reported_milestone = self.max_depth_percent;
        Some(self.max_depth_percent)
    }
}

/// Coalesces scroll events into at most one handler run per animation frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameThrottle {
    pending: bool,
}

impl FrameThrottle {
    /// Returns `true` when the caller has to schedule a frame.
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    /// Returns `true` if a frame was pending, clearing it.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}
