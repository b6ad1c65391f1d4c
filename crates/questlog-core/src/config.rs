//! Configuration management for questlog

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Global questlog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Daily focus target (minutes)
    #[serde(default = "default_daily_goal")]
    pub daily_goal_minutes: f64,

    /// Weekly focus target (minutes)
    #[serde(default = "default_weekly_goal")]
    pub weekly_goal_minutes: f64,

    /// A recovered session older than this is stopped instead of resumed
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u32,
}

fn default_daily_goal() -> f64 {
    480.0
}

fn default_weekly_goal() -> f64 {
    2400.0
}

fn default_stale_after_hours() -> u32 {
    24
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daily_goal_minutes: default_daily_goal(),
            weekly_goal_minutes: default_weekly_goal(),
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join(format!("questlog_cfg_missing_{}.json", std::process::id()));
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.stale_after_hours, 24);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"daily_goal_minutes": 120}"#).unwrap();
        assert_eq!(config.daily_goal_minutes, 120.0);
        assert_eq!(config.weekly_goal_minutes, 2400.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("questlog_cfg_save_{}", std::process::id()));
        let path = dir.join("nested").join("config.json");

        let config = Config {
            daily_goal_minutes: 300.0,
            weekly_goal_minutes: 1500.0,
            stale_after_hours: 12,
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
