//! Service configuration loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `RAILRUSH_CONFIG` environment variable (path to TOML file)
//! 2. `railrush.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded value is passed explicitly into startup wiring — there is
//! no ambient global config; every consumer receives it by reference.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variable naming an alternate config file.
pub const CONFIG_ENV_VAR: &str = "RAILRUSH_CONFIG";
/// Default config filename in the working directory.
pub const CONFIG_FILE: &str = "railrush.toml";

/// Complete service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the HTTP API
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Artifact store directory (sled database)
    pub models_dir: PathBuf,
    /// Default corpus CSV location for generate/train
    pub dataset: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Default sample count for dataset generation
    pub samples: usize,
    /// Default RNG seed for generation and training
    pub seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("data/models"),
            dataset: PathBuf::from("data/processed/festive_travel_data.csv"),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            samples: 10_000,
            seed: 42,
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            paths: PathsConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl AdvisorConfig {
    /// Load using the documented precedence. Malformed files fall back to
    /// defaults with a warning; a missing file is not an error.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&path));
        }
        if Path::new(CONFIG_FILE).exists() {
            return Self::load_from(Path::new(CONFIG_FILE));
        }
        info!("no config file found, using built-in defaults");
        Self::default()
    }

    /// Load one specific file, falling back to defaults on any failure.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "malformed config, using defaults");
                    Self::default()
                }
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable config, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sensible() {
        let config = AdvisorConfig::default();
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.generation.samples, 10_000);
        assert_eq!(config.generation.seed, 42);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed: AdvisorConfig =
            toml::from_str("[server]\naddr = \"127.0.0.1:9999\"\n").unwrap();
        assert_eq!(parsed.server.addr, "127.0.0.1:9999");
        assert_eq!(parsed.generation.samples, 10_000);
    }

    #[test]
    fn test_full_round_trip() {
        let config = AdvisorConfig::default();
        let rendered = toml::to_string(&config).unwrap();
        let parsed: AdvisorConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.server.addr, config.server.addr);
        assert_eq!(parsed.paths.models_dir, config.paths.models_dir);
    }
}
