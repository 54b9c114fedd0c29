use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard},
};

use super::{ElementId, ObserverOptions, Platform, ScrollMetrics, ViewportObserver};

#[derive(Debug)]
struct HeadlessState {
    viewport_width: u32,
    user_agent: String,
    scroll: ScrollMetrics,
    observed: BTreeSet<ElementId>,
    last_options: Option<ObserverOptions>,
    disconnects: usize,
}

/// In-process platform for hosts without a browser.
///
/// Values are set explicitly; observers created from it share one watch list
/// that can be inspected with [`HeadlessPlatform::observed`].
#[derive(Debug, Clone)]
pub struct HeadlessPlatform {
    state: Arc<Mutex<HeadlessState>>,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new(1280, "Mozilla/5.0 (headless)")
    }
}

impl HeadlessPlatform {
    pub fn new(viewport_width: u32, user_agent: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(HeadlessState {
                viewport_width,
                user_agent: user_agent.to_string(),
                scroll: ScrollMetrics::new(0.0, 0.0, 0.0),
                observed: BTreeSet::new(),
                last_options: None,
                disconnects: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_viewport_width(&self, width: u32) {
        self.lock().viewport_width = width;
    }

    pub fn set_user_agent(&self, user_agent: &str) {
        self.lock().user_agent = user_agent.to_string();
    }

    pub fn set_scroll(&self, scroll: ScrollMetrics) {
        self.lock().scroll = scroll;
    }

    /// Scroll a page of `scroll_height` to `percent` of its scrollable distance.
    pub fn scroll_to_percent(&self, percent: f64, scroll_height: f64, viewport_height: f64) {
        let top = (scroll_height - viewport_height).max(0.0) * percent / 100.0;
        self.set_scroll(ScrollMetrics::new(top, scroll_height, viewport_height));
    }

    pub fn observed(&self) -> Vec<ElementId> {
        self.lock().observed.iter().copied().collect()
    }

    pub fn last_observer_options(&self) -> Option<ObserverOptions> {
        self.lock().last_options
    }

    pub fn disconnect_count(&self) -> usize {
        self.lock().disconnects
    }
}

impl Platform for HeadlessPlatform {
    fn viewport_width(&self) -> u32 {
        self.lock().viewport_width
    }

    fn user_agent(&self) -> String {
        self.lock().user_agent.clone()
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        self.lock().scroll
    }

    fn observe_intersection(&self, options: ObserverOptions) -> Box<dyn ViewportObserver> {
        self.lock().last_options = Some(options);
        Box::new(HeadlessObserver {
            platform: self.clone(),
            connected: true,
        })
    }
}

pub struct HeadlessObserver {
    platform: HeadlessPlatform,
    connected: bool,
}

impl ViewportObserver for HeadlessObserver {
    fn observe(&mut self, element: ElementId) {
        if self.connected {
            self.platform.lock().observed.insert(element);
        }
    }

    fn unobserve(&mut self, element: ElementId) {
        self.platform.lock().observed.remove(&element);
    }

    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        let mut state = self.platform.lock();
        state.observed.clear();
        state.disconnects += 1;
    }
}
