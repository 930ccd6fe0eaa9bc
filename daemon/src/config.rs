//! Configuration management (TOML)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    #[serde(default)]
    pub process: ProcessConfig,
    #[serde(default)]
    pub trend: TrendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub sample_interval_secs: u64,
    pub history_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    #[serde(default)]
    pub pids: Vec<u32>,
    #[serde(default = "default_include_children")]
    pub include_children: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Instant rates above this percentage are reported as warnings.
    pub rate_warning_percent: f64,
}

fn default_include_children() -> bool {
    true
}

impl Default for ProcessConfig {
    fn default() -> Self {
        ProcessConfig {
            pids: vec![],
            include_children: default_include_children(),
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            rate_warning_percent: 50.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            general: GeneralConfig {
                sample_interval_secs: 5,
                history_depth: 10,
            },
            process: ProcessConfig::default(),
            trend: TrendConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        if config.general.sample_interval_secs == 0 {
            return Err("general.sample_interval_secs must be at least 1".into());
        }
        if config.general.history_depth < 2 {
            return Err("general.history_depth must be at least 2 to compute trends".into());
        }
        Ok(config)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.general.sample_interval_secs)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> std::path::PathBuf {
        directories::ProjectDirs::from("", "", "statwatch")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| std::path::PathBuf::from("config.toml"))
    }
}
