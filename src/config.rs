//! Engine configuration: timing windows, viewport and storage keys.

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::visibility::VISIBILITY_STORAGE_KEY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Repeat toggles of the same slot inside this window are dropped.
    pub toggle_debounce_ms: u64,
    /// Quiet period after the last external mutation before a re-sync runs.
    pub resync_debounce_ms: u64,
    /// Minimum time between two admitted randomize calls.
    pub randomize_cooldown_ms: u64,
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Gap kept between an expanded region and the viewport edges.
    pub region_edge_padding: f32,
    pub visibility_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            toggle_debounce_ms: 300,
            resync_debounce_ms: 300,
            randomize_cooldown_ms: 300,
            viewport_width: 1280.0,
            viewport_height: 800.0,
            region_edge_padding: 8.0,
            visibility_key: VISIBILITY_STORAGE_KEY.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse engine config")
    }

    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path))?;
        Self::from_json(&text).with_context(|| format!("In config {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "toggleDebounceMs": 50, "viewportWidth": 640 }"#)
            .unwrap();
        assert_eq!(cfg.toggle_debounce_ms, 50);
        assert_eq!(cfg.viewport_width, 640.0);
        assert_eq!(cfg.resync_debounce_ms, 300);
        assert_eq!(cfg.visibility_key, VISIBILITY_STORAGE_KEY);
    }
}
