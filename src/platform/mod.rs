//! Host capabilities the trackers read from instead of touching browser globals.
//!
//! A browser host backs these with the window, navigator and
//! `IntersectionObserver`; anything else (tests, native shells) can use
//! [`HeadlessPlatform`].

mod clock;
mod headless;

pub use clock::{Clock, ManualClock, SystemClock};
pub use headless::{HeadlessObserver, HeadlessPlatform};

/// Non-owning handle to a page element. The hosting page owns the element;
/// trackers only use the handle to talk to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, scroll_height: f64, viewport_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            viewport_height,
        }
    }

    /// Scroll position as a whole percentage of the scrollable distance.
    ///
    /// `None` when the page is not taller than the viewport.
    pub fn depth_percent(&self) -> Option<u32> {
        let scrollable = self.scroll_height - self.viewport_height;
        if !(scrollable > 0.0) {
            return None;
        }

        let percent = (self.scroll_top / scrollable * 100.0).round();
        Some(percent.clamp(0.0, 100.0) as u32)
    }
}

/// One visibility change reported by the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub fn entered(target: ElementId) -> Self {
        Self {
            target,
            is_intersecting: true,
        }
    }

    pub fn left(target: ElementId) -> Self {
        Self {
            target,
            is_intersecting: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the element that must be visible to count as intersecting.
    pub threshold: f64,
    pub root_margin_px: i32,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            root_margin_px: 0,
        }
    }
}

/// Viewport intersection observer.
///
/// Crossing events are delivered by the host to
/// `SectionVisibilityTracker::handle_intersection`; the observer itself only
/// tracks which elements are watched.
pub trait ViewportObserver: Send {
    /// Start watching `element`. Observing an already watched element is a no-op.
    fn observe(&mut self, element: ElementId);
    fn unobserve(&mut self, element: ElementId);
    /// Stop watching everything and drop every element handle.
    fn disconnect(&mut self);
}

pub trait Platform: Send + Sync {
    fn viewport_width(&self) -> u32;
    fn user_agent(&self) -> String;
    fn scroll_metrics(&self) -> ScrollMetrics;
    fn observe_intersection(&self, options: ObserverOptions) -> Box<dyn ViewportObserver>;
}
