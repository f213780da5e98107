//! Persisted UI preferences (zoom, last preset).

use serde::{Deserialize, Serialize};

use crate::visibility::KeyValueStorage;

/// Storage key of the preferences record.
pub const PREFS_STORAGE_KEY: &str = "rephrase-ui-prefs";

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiPrefs {
    pub zoom: f32,
    pub last_preset: Option<String>,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            last_preset: None,
        }
    }
}

impl UiPrefs {
    /// Load from storage; missing or unreadable prefs fall back to defaults.
    pub fn load(storage: &dyn KeyValueStorage) -> Self {
        match storage.get(PREFS_STORAGE_KEY) {
            Ok(Some(text)) => match serde_json::from_str::<UiPrefs>(&text) {
                Ok(mut p) => {
                    p.zoom = clamp_zoom(p.zoom);
                    p
                }
                Err(err) => {
                    log::warn!("ui prefs unreadable ({}), using defaults", err);
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(err) => {
                log::warn!("ui prefs storage failed ({:#}), using defaults", err);
                Self::default()
            }
        }
    }

    /// Record `preset_id` as the one to reopen next time and save.
    pub fn remember_preset(&mut self, preset_id: &str, storage: &dyn KeyValueStorage) {
        if self.last_preset.as_deref() == Some(preset_id) {
            return;
        }
        self.last_preset = Some(preset_id.to_string());
        self.save(storage);
    }

    /// Save to storage. Failures are logged only.
    pub fn save(&self, storage: &dyn KeyValueStorage) {
        let result = serde_json::to_string(self)
            .map_err(anyhow::Error::from)
            .and_then(|t| storage.set(PREFS_STORAGE_KEY, &t));
        if let Err(err) = result {
            log::warn!("failed to save ui prefs: {:#}", err);
        }
    }
}

pub fn clamp_zoom(z: f32) -> f32 {
    if z.is_finite() { z.clamp(MIN_ZOOM, MAX_ZOOM) } else { 1.0 }
}
