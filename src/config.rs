//! Configuration management for mudra
//!
//! Exposes the pipeline tunables with schema versioning and JSON
//! persistence. Configuration is stored in `~/.mudra/config.json`; a
//! process-wide cached copy is available through `get_config` /
//! `update_config` for hosts that want the persistent surface, while the
//! pipeline itself takes a `PipelineConfig` by value so tests and embedded
//! uses never touch the filesystem.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

/// Global config instance for caching
static CONFIG: OnceLock<RwLock<PipelineConfig>> = OnceLock::new();

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Schema version for migrations
    pub version: u32,
    /// Window capture settings
    pub capture: CaptureConfig,
    /// Classifier settings
    pub inference: InferenceConfig,
    /// Debounce and post-detection cooldown settings
    pub cooldown: CooldownConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            capture: CaptureConfig::default(),
            inference: InferenceConfig::default(),
            cooldown: CooldownConfig::default(),
        }
    }
}

/// Window capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frames per classification window (N)
    pub window_frames: usize,
    /// Values per feature vector (L); 21 landmarks × 3 coordinates
    pub feature_len: usize,
    /// Abort a session whose window stays partial this long
    pub collection_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            window_frames: 30,
            feature_len: 63,
            collection_timeout_ms: 3000,
        }
    }
}

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Number of gesture classes the model emits (K)
    pub class_count: usize,
    /// Bounded depth of the request/outcome channels
    pub queue_depth: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            class_count: 4,
            queue_depth: 8,
        }
    }
}

/// Debounce and cooldown configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Capture stays paused this long after a dispatched action
    pub post_detection_cooldown_ms: u64,
    /// Minimum spacing between two dispatched actions
    pub suppression_window_ms: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            post_detection_cooldown_ms: 10_000,
            suppression_window_ms: 1000,
        }
    }
}

/// Path to the config file (~/.mudra/config.json)
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mudra").join("config.json"))
}

/// Loads configuration from the default path, falling back to defaults
///
/// A missing file is normal on first run; a malformed file is logged and
/// replaced by defaults rather than failing the host.
pub fn load_config() -> PipelineConfig {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            tracing::warn!("Could not resolve home directory; using default config");
            PipelineConfig::default()
        }
    }
}

/// Loads configuration from an explicit path
pub fn load_config_from(path: &std::path::Path) -> PipelineConfig {
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<PipelineConfig>(&contents) {
            Ok(mut config) => {
                if config.version != CURRENT_VERSION {
                    tracing::info!(
                        "Migrating config from version {} to {}",
                        config.version,
                        CURRENT_VERSION
                    );
                    config.version = CURRENT_VERSION;
                }
                config
            }
            Err(e) => {
                tracing::warn!("Malformed config at {}: {}; using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        Err(_) => PipelineConfig::default(),
    }
}

/// Saves configuration to the default path
pub fn save_config(config: &PipelineConfig) -> anyhow::Result<()> {
    let path = config_path().ok_or_else(|| anyhow::anyhow!("could not find home directory"))?;
    save_config_to(config, &path)
}

/// Saves configuration to an explicit path
pub fn save_config_to(config: &PipelineConfig, path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    tracing::debug!("Config saved to {}", path.display());
    Ok(())
}

fn config_cache() -> &'static RwLock<PipelineConfig> {
    CONFIG.get_or_init(|| RwLock::new(load_config()))
}

/// Returns a copy of the cached configuration
pub fn get_config() -> PipelineConfig {
    config_cache().read().clone()
}

/// Updates the cached configuration and persists it
pub fn update_config(config: PipelineConfig) -> anyhow::Result<()> {
    save_config(&config)?;
    *config_cache().write() = config;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_constants_match_observed_domain() {
        let config = PipelineConfig::default();
        assert_eq!(config.capture.window_frames, 30);
        assert_eq!(config.capture.feature_len, 63);
        assert_eq!(config.capture.collection_timeout_ms, 3000);
        assert_eq!(config.inference.class_count, 4);
        assert_eq!(config.cooldown.post_detection_cooldown_ms, 10_000);
        assert_eq!(config.cooldown.suppression_window_ms, 1000);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = PipelineConfig::default();
        config.capture.window_frames = 15;
        config.cooldown.suppression_window_ms = 250;

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path);

        assert_eq!(loaded.capture.window_frames, 15);
        assert_eq!(loaded.cooldown.suppression_window_ms, 250);
        assert_eq!(loaded.version, CURRENT_VERSION);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from(&dir.path().join("nonexistent.json"));
        assert_eq!(config.capture.window_frames, 30);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.inference.class_count, 4);
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"capture":{"window_frames":10}}"#).unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.capture.window_frames, 10);
        // Unspecified fields come from defaults
        assert_eq!(config.capture.feature_len, 63);
        assert_eq!(config.cooldown.suppression_window_ms, 1000);
    }
}
