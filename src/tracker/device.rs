use crate::{
    models::{ClientInfo, DeviceType},
    platform::Platform,
};

const MOBILE_MAX_WIDTH: u32 = 768;
const TABLET_MAX_WIDTH: u32 = 1024;

pub fn classify_device(viewport_width: u32) -> DeviceType {
    if viewport_width < MOBILE_MAX_WIDTH {
        DeviceType::Mobile
    } else if viewport_width < TABLET_MAX_WIDTH {
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    }
}

/// Browser family by ordered substring match. Chrome-based Edge reports
/// itself as Chrome, same as the dashboards have always counted it.
pub fn detect_browser(user_agent: &str) -> &'static str {
    if user_agent.contains("Firefox") {
        "Firefox"
    } else if user_agent.contains("Chrome") {
        "Chrome"
    } else if user_agent.contains("Safari") {
        "Safari"
    } else if user_agent.contains("Edge") {
        "Edge"
    } else {
        "Unknown"
    }
}

pub fn client_info(platform: &dyn Platform) -> ClientInfo {
    ClientInfo {
        device_type: classify_device(platform.viewport_width()),
        browser: detect_browser(&platform.user_agent()).to_string(),
    }
}
