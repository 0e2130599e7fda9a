//! File configuration for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use racecal_core::ExtractorSettings;
use racecal_core::sources::HttpTimeouts;

/// TOML-backed file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// HTTP connect timeout in seconds.
    pub http_connect_timeout_secs: Option<u64>,
    /// HTTP total request timeout in seconds.
    pub http_read_timeout_secs: Option<u64>,
    /// Network capture timeout for the calendar page, in seconds.
    pub capture_timeout_secs: Option<u64>,
    /// Network capture timeout per event detail page, in seconds.
    pub detail_capture_timeout_secs: Option<u64>,
    /// Pause between detail-page fetches during backfill, in milliseconds.
    pub detail_delay_ms: Option<u64>,
    /// Pause between two-phase generative requests, in milliseconds.
    pub generative_delay_ms: Option<u64>,
    /// Character ceiling for cleaned page content sent to the model.
    pub prompt_ceiling: Option<usize>,
    /// Generative model name.
    pub model: Option<String>,
    /// Default for `--upcoming`.
    pub upcoming_only: Option<bool>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("http_connect_timeout_secs", self.http_connect_timeout_secs)?;
        validate_timeout_secs("http_read_timeout_secs", self.http_read_timeout_secs)?;
        validate_timeout_secs("capture_timeout_secs", self.capture_timeout_secs)?;
        validate_timeout_secs("detail_capture_timeout_secs", self.detail_capture_timeout_secs)?;
        validate_delay_ms("detail_delay_ms", self.detail_delay_ms)?;
        validate_delay_ms("generative_delay_ms", self.generative_delay_ms)?;

        if let Some(ceiling) = self.prompt_ceiling
            && ceiling < 1000
        {
            bail!("Invalid config value for `prompt_ceiling`: {ceiling}. Expected at least 1000");
        }
        if let Some(model) = &self.model
            && model.trim().is_empty()
        {
            bail!("Invalid config value for `model`: must not be empty");
        }
        Ok(())
    }

    /// HTTP timeouts with defaults for unset values.
    #[must_use]
    pub fn http_timeouts(&self) -> HttpTimeouts {
        let defaults = HttpTimeouts::default();
        HttpTimeouts {
            connect: self
                .http_connect_timeout_secs
                .map_or(defaults.connect, Duration::from_secs),
            read: self
                .http_read_timeout_secs
                .map_or(defaults.read, Duration::from_secs),
        }
    }

    /// Extractor settings with defaults for unset values.
    #[must_use]
    pub fn extractor_settings(&self) -> ExtractorSettings {
        let defaults = ExtractorSettings::default();
        ExtractorSettings {
            capture_timeout: self
                .capture_timeout_secs
                .map_or(defaults.capture_timeout, Duration::from_secs),
            detail_capture_timeout: self
                .detail_capture_timeout_secs
                .map_or(defaults.detail_capture_timeout, Duration::from_secs),
            detail_delay: self
                .detail_delay_ms
                .map_or(defaults.detail_delay, Duration::from_millis),
            generative_delay: self
                .generative_delay_ms
                .map_or(defaults.generative_delay, Duration::from_millis),
        }
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

fn validate_delay_ms(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if value > 60_000 {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 0..=60000");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

impl LoadedConfig {
    /// The loaded config, or an all-defaults one.
    #[must_use]
    pub fn effective(&self) -> FileConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/racecal/config.toml`
/// 2. `$HOME/.config/racecal/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("racecal").join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("racecal")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` when given (it must exist), else from the
/// default path if present.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref().filter(|p| p.exists()) else {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    };

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}
