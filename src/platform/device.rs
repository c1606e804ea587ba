//! Device class detection
//!
//! The class is detected once at startup and pinned for the whole session.
//! There is no runtime re-detection if the input actually received disagrees.

use serde::{Deserialize, Serialize};

/// User agent fragments that mark a touch-first device
const MOBILE_MARKERS: [&str; 10] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
    "mobile",
    "tablet",
];

/// Input device class, also the leaderboard's `device_type` bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    #[default]
    Pc,
    Mobile,
}

impl DeviceClass {
    /// Classify a user agent string
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        if MOBILE_MARKERS.iter().any(|marker| ua.contains(marker)) {
            DeviceClass::Mobile
        } else {
            DeviceClass::Pc
        }
    }

    /// Detect from `navigator.userAgent` (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn detect_browser() -> Self {
        let ua = web_sys::window()
            .and_then(|w| w.navigator().user_agent().ok())
            .unwrap_or_default();
        let class = Self::detect(&ua);
        log::info!("Detected device class {:?}", class);
        class
    }

    /// Wire label used by the leaderboard API
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Pc => "pc",
            DeviceClass::Mobile => "mobile",
        }
    }

    /// Human-readable label for the HUD
    pub fn label(&self) -> &'static str {
        match self {
            DeviceClass::Pc => "PC",
            DeviceClass::Mobile => "Mobile",
        }
    }
}
