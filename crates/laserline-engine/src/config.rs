//! Engine configuration.
//!
//! Host settings plus the full gameplay tuning. Configuration can be loaded
//! from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

use laserline_gameplay::GameplayConfig;

/// Configuration file name.
pub const CONFIG_FILE: &str = "laserline.toml";

/// Tracing filter used until the configuration is loaded.
pub const DEFAULT_LOG_FILTER: &str = "laserline=info";

/// Engine configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Host Settings ===
    /// Seconds simulated per tick
    pub fixed_timestep: f32,
    /// Hard cap on simulated seconds
    pub max_seconds: f32,
    /// RNG seed for the match
    pub seed: u64,
    /// Tracing filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Print the match report as JSON
    pub json_report: bool,

    // === Gameplay ===
    /// Gameplay tuning
    pub gameplay: GameplayConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            max_seconds: 300.0,
            seed: 0x1A5E_711E,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            json_report: true,
            gameplay: GameplayConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        if !self.fixed_timestep.is_finite() {
            self.fixed_timestep = 1.0 / 60.0;
        }
        self.fixed_timestep = self.fixed_timestep.clamp(0.001, 0.25);
        if !self.max_seconds.is_finite() {
            self.max_seconds = 300.0;
        }
        self.max_seconds = self.max_seconds.clamp(1.0, 3600.0);
        if self.log_filter.trim().is_empty() {
            self.log_filter = DEFAULT_LOG_FILTER.to_string();
        }
        self.gameplay.validate();
    }

    /// Resolves the tracing filter directive.
    ///
    /// A non-empty `env` value (normally `RUST_LOG`) wins over the
    /// configured filter.
    #[must_use]
    pub fn log_directive(&self, env: Option<&str>) -> String {
        match env.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => value.to_string(),
            None => self.log_filter.clone(),
        }
    }

    /// Number of ticks the host runs at most.
    #[must_use]
    pub fn max_ticks(&self) -> u64 {
        (self.max_seconds / self.fixed_timestep).ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!((config.fixed_timestep - 1.0 / 60.0).abs() < f32::EPSILON);
        assert_eq!(config.log_filter, "laserline=info");
        assert_eq!(config.gameplay.spawners.len(), 2);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        config.fixed_timestep = 0.0;
        config.max_seconds = f32::NAN;
        config.log_filter = "  ".to_string();

        config.validate();

        assert!((config.fixed_timestep - 0.001).abs() < 1e-6);
        assert_eq!(config.max_seconds, 300.0);
        assert_eq!(config.log_filter, "laserline=info");
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = EngineConfig::default();
        config.seed = 12345;
        config.max_seconds = 42.0;
        config.gameplay.rules.victory_time = 60.0;
        config.gameplay.npc.message = "Run!".to_string();

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.seed, 12345);
        assert_eq!(loaded.max_seconds, 42.0);
        assert_eq!(loaded.gameplay.rules.victory_time, 60.0);
        assert_eq!(loaded.gameplay.npc.message, "Run!");
        assert_eq!(loaded.gameplay.spawners.len(), 2);
    }

    #[test]
    fn test_config_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "seed = 7\n\n[gameplay.rules]\nvictory_time = 30.0\n")
            .expect("Failed to write config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.seed, 7);
        assert_eq!(loaded.gameplay.rules.victory_time, 30.0);
        assert_eq!(loaded.gameplay.rules.outro_duration, 3.0);
        assert_eq!(loaded.gameplay.player.base.max_hp, 5);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/laserline.toml");
        assert_eq!(config.seed, EngineConfig::default().seed);
    }

    #[test]
    fn test_config_load_malformed_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "seed = \"not a number\"").expect("Failed to write config");

        let config = EngineConfig::load_from(&config_path);
        assert_eq!(config.seed, EngineConfig::default().seed);
    }

    #[test]
    fn test_log_directive_prefers_env() {
        let config = EngineConfig {
            log_filter: "laserline=debug".to_string(),
            ..EngineConfig::default()
        };
        assert_eq!(config.log_directive(Some("warn")), "warn");
        assert_eq!(config.log_directive(Some("  ")), "laserline=debug");
        assert_eq!(config.log_directive(None), "laserline=debug");
        assert_eq!(EngineConfig::default().log_directive(None), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_max_ticks() {
        let config = EngineConfig {
            fixed_timestep: 0.5,
            max_seconds: 10.0,
            ..EngineConfig::default()
        };
        assert_eq!(config.max_ticks(), 20);
    }
}
