mod schema;

pub use schema::HostConfig;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

use crate::debug_flags::DebugFlags;
use crate::plugin::SiteFactorHost;

/// Get the config directory path (~/.config/site-factor/)
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".config")
        .join("site-factor")
}

/// Get the default config file path (~/.config/site-factor/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load host configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/site-factor/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - The config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
/// - `nice_offset` is zero
/// - A debug flag name is unknown
pub fn load_config(path: Option<PathBuf>) -> Result<HostConfig> {
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Create ~/.config/site-factor/config.yaml",
            config_path.display()
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: HostConfig = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    if config.nice_offset == 0 {
        anyhow::bail!(
            "Invalid nice_offset in {}: must be at least 1",
            config_path.display()
        );
    }

    DebugFlags::from_names(config.debug_flags.as_slice())
        .with_context(|| format!("Invalid debug_flags in {}", config_path.display()))?;

    Ok(config)
}

/// A host backed by a static configuration file.
///
/// `params_override` replaces the configured parameter line, e.g. from the
/// command line. `now_override` pins the clock for reproducible runs.
#[derive(Debug, Clone)]
pub struct StaticHost {
    pub config: HostConfig,
    pub params_override: Option<String>,
    pub now_override: Option<DateTime<Utc>>,
}

impl StaticHost {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            params_override: None,
            now_override: None,
        }
    }

    pub fn with_params(mut self, params: Option<String>) -> Self {
        self.params_override = params;
        self
    }

    pub fn with_now(mut self, now: Option<DateTime<Utc>>) -> Self {
        self.now_override = now;
        self
    }
}

impl SiteFactorHost for StaticHost {
    fn site_factor_params(&self) -> Option<String> {
        self.params_override
            .clone()
            .or_else(|| self.config.priority_site_factor_parameters.clone())
    }

    fn debug_flags(&self) -> DebugFlags {
        // Names were checked in load_config; unknown ones are ignored here.
        self.config
            .debug_flags
            .iter()
            .filter_map(|n| DebugFlags::parse(n).ok())
            .fold(DebugFlags::NONE, |acc, f| acc | f)
    }

    fn nice_offset(&self) -> u32 {
        self.config.nice_offset
    }

    fn now(&self) -> DateTime<Utc> {
        self.now_override.unwrap_or_else(Utc::now)
    }
}
