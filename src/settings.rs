//! Application settings
//!
//! A JSON file on native, LocalStorage on web. Missing or unreadable
//! settings fall back to defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::counter;

/// Where and under which names values are stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding store files (native only)
    pub data_dir: PathBuf,
    /// Store namespace; the file stem of the native store
    pub namespace: String,
    /// Key the counter is stored under
    pub counter_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            namespace: "app".to_string(),
            counter_key: counter::STORAGE_KEY.to_string(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("persistent-value"))
        .unwrap_or_else(|| PathBuf::from(".persistent-value"))
}

#[cfg(target_arch = "wasm32")]
fn default_data_dir() -> PathBuf {
    PathBuf::new()
}

impl Settings {
    /// Parse settings JSON; absent fields take their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from `path`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(err) => log::warn!("Ignoring settings in {}: {}", path.display(), err),
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => log::warn!("Could not read {}: {}", path.display(), err),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to `path`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "persistent_value_settings";

    /// Load settings from LocalStorage
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = Self::from_json(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }
}
