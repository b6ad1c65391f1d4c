//! Standard paths used by questlog

use std::path::PathBuf;

/// Environment override for the data directory
pub const DATA_DIR_ENV: &str = "QUESTLOG_DATA_DIR";

/// Environment override for the config directory
pub const CONFIG_DIR_ENV: &str = "QUESTLOG_CONFIG_DIR";

/// Standard questlog paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Data directory (~/.local/share/questlog)
    pub data: PathBuf,
    /// Config directory (~/.config/questlog)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                    .join("questlog")
            });

        let config = std::env::var_os(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("~/.config"))
                    .join("questlog")
            });

        Self { data, config }
    }

    /// Paths rooted at a single directory (used by tests and embedders)
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            data: root.join("data"),
            config: root.join("config"),
        }
    }

    /// Path of the main config file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }

    /// Get state directory for a tool
    pub fn state(&self, tool: &str) -> PathBuf {
        self.data.join(tool)
    }
}
