use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::{NeuroError, Result};

pub const DEFAULT_SESSION_SECS: u64 = 30;
pub const DEFAULT_LENGTH_STEP_SECS: u64 = 30;
pub const DEFAULT_TICK_RATE_MS: u64 = 100;
/// One day
pub const MAX_SESSION_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub session_secs: u64,
    /// Increment applied by the up/down keys
    pub length_step_secs: u64,
    pub tick_rate_ms: u64,
    /// Electrodes read from the headset (simulated source only)
    pub channels: usize,
    /// Epochs averaged by the smoothing buffer
    pub smoothing_window: usize,
    /// Mean alpha at or above this lights the focus cue
    pub alpha_cue_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_secs: DEFAULT_SESSION_SECS,
            length_step_secs: DEFAULT_LENGTH_STEP_SECS,
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
            channels: 2,
            smoothing_window: 5,
            alpha_cue_threshold: 0.8,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.session_secs == 0 {
            return Err(NeuroError::InvalidConfig(
                "session_secs must be positive".into(),
            ));
        }
        if self.session_secs > MAX_SESSION_SECS {
            return Err(NeuroError::InvalidConfig(format!(
                "session_secs {} is longer than {MAX_SESSION_SECS}",
                self.session_secs
            )));
        }
        if self.length_step_secs == 0 {
            return Err(NeuroError::InvalidConfig(
                "length_step_secs must be positive".into(),
            ));
        }
        if self.tick_rate_ms == 0 {
            return Err(NeuroError::InvalidConfig(
                "tick_rate_ms must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.alpha_cue_threshold) {
            return Err(NeuroError::InvalidConfig(format!(
                "alpha_cue_threshold {} is outside 0..=1",
                self.alpha_cue_threshold
            )));
        }
        Ok(())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("neurofeed_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) if cfg.validate().is_ok() => return cfg,
                Ok(_) => log::warn!("ignoring invalid config at {}", self.path.display()),
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            session_secs: 120,
            length_step_secs: 15,
            tick_rate_ms: 50,
            channels: 4,
            smoothing_window: 8,
            alpha_cue_threshold: 0.6,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"session_secs": 90}"#).unwrap();

        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.session_secs, 90);
        assert_eq!(loaded.length_step_secs, DEFAULT_LENGTH_STEP_SECS);
    }

    #[test]
    fn invalid_config_on_disk_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"session_secs": 0}"#).unwrap();

        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = Config {
            tick_rate_ms: 0,
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(NeuroError::InvalidConfig(_)));

        let cfg = Config {
            alpha_cue_threshold: 1.5,
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(NeuroError::InvalidConfig(_)));

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_bounds_session_length() {
        let cfg = Config {
            session_secs: MAX_SESSION_SECS,
            ..Config::default()
        };
        assert!(cfg.validate().is_ok());

        let cfg = Config {
            session_secs: MAX_SESSION_SECS + 1,
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(NeuroError::InvalidConfig(_)));

        let cfg = Config {
            session_secs: u64::MAX,
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(NeuroError::InvalidConfig(_)));
    }
}
