//! Player preferences
//!
//! Last-used run configuration, mode and player name, persisted in
//! LocalStorage so the settings screen reopens where the player left it.

use serde::{Deserialize, Serialize};

use crate::sim::{RunConfig, RunMode};

/// Stored preferences
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Practice-mode settings screen choices
    #[serde(default)]
    pub run: RunConfig,
    /// Mode button highlighted on the menu
    #[serde(default)]
    pub mode: RunMode,
    /// Prefill for the ranked name field
    #[serde(default)]
    pub username: Option<String>,
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "bullet_hell_settings";

    /// Parse stored JSON; unknown or broken data yields `None`
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str::<Self>(json) {
            Ok(mut settings) => {
                settings.run = settings.run.sanitized();
                Some(settings)
            }
            Err(e) => {
                log::warn!("Ignoring stored settings: {}", e);
                None
            }
        }
    }

    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    /// Remember the name a ranked run was confirmed with
    pub fn remember_username(&mut self, name: &str) {
        let name = name.trim();
        self.username = (!name.is_empty()).then(|| name.to_string());
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Some(settings) = Self::from_json(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let (Some(storage), Some(json)) = (storage, self.to_json()) {
            if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                log::warn!("Could not write settings to LocalStorage");
            } else {
                log::debug!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        log::debug!("Settings not persisted on native ({})", Self::STORAGE_KEY);
    }
}
