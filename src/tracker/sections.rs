//! Per-section visibility, dwell time and scroll depth for one page.

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    models::SectionId,
    platform::{Clock, ElementId, IntersectionEntry, ObserverOptions, Platform, ViewportObserver},
    settings::TrackerSettings,
};

use super::{
    engagement::EngagementTracker,
    scroll::{FrameThrottle, ScrollProgress},
    timer::SectionTimer,
};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionTrackingOptions {
    /// Visible fraction that counts as "in view". Default 0.5.
    pub threshold: f64,
    /// Minimum unreported dwell time worth a `SECTION_TIME` event. Default 1000ms.
    pub min_time_ms: u64,
}

impl Default for SectionTrackingOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            min_time_ms: 1_000,
        }
    }
}

impl From<&TrackerSettings> for SectionTrackingOptions {
    fn from(settings: &TrackerSettings) -> Self {
        Self {
            threshold: settings.intersection_threshold,
            min_time_ms: settings.min_section_time_ms,
        }
    }
}

#[derive(Debug)]
struct TrackedSection {
    element: ElementId,
    title: String,
    seen: bool,
    timer: SectionTimer,
}

/// Watches the registered sections of a page.
///
/// Two independent axes per section: `seen` flips once and produces the
/// single `SECTION_VIEW`, while every visible interval feeds the dwell
/// timer. Several sections may be visible and timing at once.
pub struct SectionVisibilityTracker {
    engagement: EngagementTracker,
    platform: Arc<dyn Platform>,
    clock: Arc<dyn Clock>,
    options: SectionTrackingOptions,
    sections: BTreeMap<SectionId, TrackedSection>,
    observer: Option<Box<dyn ViewportObserver>>,
    scroll: ScrollProgress,
    throttle: FrameThrottle,
    listening_for_scroll: bool,
}

impl SectionVisibilityTracker {
    pub fn new(
        engagement: EngagementTracker,
        platform: Arc<dyn Platform>,
        clock: Arc<dyn Clock>,
        options: SectionTrackingOptions,
    ) -> Self {
        Self {
            engagement,
            platform,
            clock,
            options,
            sections: BTreeMap::new(),
            observer: None,
            scroll: ScrollProgress::default(),
            throttle: FrameThrottle::default(),
            listening_for_scroll: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.observer.is_some()
    }

    /// Creates the viewport observer, observes every section registered so
    /// far and starts accepting scroll events.
    pub fn attach(&mut self) {
        if self.observer.is_none() {
            let mut observer = self.platform.observe_intersection(ObserverOptions {
                threshold: self.options.threshold,
                root_margin_px: 0,
            });
            for section in self.sections.values() {
                observer.observe(section.element);
            }
            self.observer = Some(observer);
        }
        self.listening_for_scroll = true;
    }

    /// Associates `element` with `section_id`. `None` (element not mounted
    /// yet) is ignored. Re-registering keeps the section's seen flag and timer.
    pub fn register_section(
        &mut self,
        element: Option<ElementId>,
        section_id: SectionId,
        title: &str,
    ) {
        let Some(element) = element else {
            return;
        };

        let previous = match self.sections.get_mut(&section_id) {
            Some(section) => {
                section.title = title.to_string();
                let previous = section.element;
                section.element = element;
                Some(previous)
            }
            None => {
                self.sections.insert(
                    section_id,
                    TrackedSection {
                        element,
                        title: title.to_string(),
                        seen: false,
                        timer: SectionTimer::new(),
                    },
                );
                None
            }
        };

        if previous == Some(element) {
            return;
        }

        if let Some(observer) = self.observer.as_mut() {
            if let Some(previous) = previous {
                observer.unobserve(previous);
            }
            observer.observe(element);
        }
    }

    /// Observer callback: sections crossing the visibility threshold.
    pub fn handle_intersection(&mut self, entries: &[IntersectionEntry]) {
        let now = self.clock.now_ms();

        for entry in entries {
            let Some((&section_id, section)) = self
                .sections
                .iter_mut()
                .find(|(_, section)| section.element == entry.target)
            else {
                continue;
            };

            if entry.is_intersecting {
                if !section.seen {
                    section.seen = true;
                    self.engagement
                        .track_section_view(section_id, &section.title);
                }
                section.timer.start(now);
            } else {
                let elapsed = section.timer.stop(now);
                if elapsed > 0 {
                    log_debug!("{section_id} left view after {elapsed}ms");
                }
            }
        }
    }

    /// Raw scroll event. Returns `true` when the host has to schedule an
    /// animation frame that calls [`Self::on_animation_frame`].
    pub fn on_scroll(&mut self) -> bool {
        self.listening_for_scroll && self.throttle.request()
    }

    pub fn on_animation_frame(&mut self) {
        if self.throttle.take() && self.listening_for_scroll {
            self.handle_scroll();
        }
    }

    /// Reads the current scroll position and reports a newly crossed milestone.
    pub fn handle_scroll(&mut self) {
        let Some(current) = self.platform.scroll_metrics().depth_percent() else {
            return;
        };

        if let Some(milestone) = self.scroll.record(current) {
            log_debug!("scroll milestone {milestone}% reached");
            self.engagement
                .track_scroll_depth(current, self.scroll.max_depth_percent());
        }
    }

    /// Reports dwell time not sent yet and any unreported scroll depth.
    /// Safe to call repeatedly; time is only ever reported once.
    pub fn flush_section_times(&mut self) {
        let now = self.clock.now_ms();

        for (&section_id, section) in self.sections.iter_mut() {
            if let Some(time_spent_ms) = section.timer.take_report(now, self.options.min_time_ms) {
                self.engagement
                    .track_section_time(section_id, time_spent_ms);
            }
        }

        if let Some(max_depth) = self.scroll.take_final() {
            let current = self
                .platform
                .scroll_metrics()
                .depth_percent()
                .unwrap_or(max_depth);
            self.engagement.track_scroll_depth(current, max_depth);
        }
    }

    /// Disconnects the observer, stops scroll handling and flushes. Running
    /// timers are closed so nothing accrues after the page is gone.
    pub fn teardown(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.disconnect();
        }
        self.listening_for_scroll = false;
        self.throttle = FrameThrottle::default();

        let now = self.clock.now_ms();
        for section in self.sections.values_mut() {
            section.timer.stop(now);
        }
        self.flush_section_times();
    }

    pub fn is_seen(&self, section_id: SectionId) -> bool {
        self.sections
            .get(&section_id)
            .map(|section| section.seen)
            .unwrap_or(false)
    }

    /// Dwell time so far, including a still-running interval.
    pub fn dwell_ms(&self, section_id: SectionId) -> Option<u64> {
        let now = self.clock.now_ms();
        self.sections
            .get(&section_id)
            .map(|section| section.timer.effective_ms(now))
    }

    pub fn scroll_progress(&self) -> ScrollProgress {
        self.scroll
    }

    pub fn registered_sections(&self) -> Vec<SectionId> {
        self.sections.keys().copied().collect()
    }
}
