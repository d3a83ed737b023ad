use funnel_editor::ResizeConfig;
use funnel_popups::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "funnel.config.json";

/// Funnel builder configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Directory holding the persisted document and popup frequency records
    pub storage_dir: String,

    pub document_key: String,

    /// Prefix for per-popup frequency records
    pub frequency_key_prefix: String,

    /// Page path used when none is given
    pub default_path: String,

    /// Debounce before an on-page-load popup opens
    pub page_load_delay_ms: i64,

    /// Smallest width a column can be resized down to
    pub min_column_width: f64,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to storage directory
    pub fn get_storage_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.storage_dir)
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            page_load_delay_ms: self.page_load_delay_ms,
        }
    }

    pub fn resize(&self) -> ResizeConfig {
        ResizeConfig {
            min_width: self.min_column_width,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: ".funnel".to_string(),
            document_key: funnel_editor::DEFAULT_DOCUMENT_KEY.to_string(),
            frequency_key_prefix: funnel_popups::DEFAULT_KEY_PREFIX.to_string(),
            default_path: "/".to_string(),
            page_load_delay_ms: funnel_popups::DEFAULT_PAGE_LOAD_DELAY_MS,
            min_column_width: funnel_editor::MIN_COLUMN_WIDTH,
        }
    }
}
