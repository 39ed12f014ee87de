//! Configuration loading and config file resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `RACESHEET_CONFIG` environment variable
//! 3. `<os config dir>/racesheet/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not fatal: a warning is logged and compiled
//! defaults are used. Individual environment overrides are applied on top of
//! whatever was loaded.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::a1::RangeRef;
use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RACESHEET_CONFIG";
/// Verification mode override (`0|1|2` or mode name)
pub const VERIFY_ENV_VAR: &str = "RACESHEET_VERIFY";
/// Short quota cooldown override in minutes
pub const SHORT_COOLDOWN_ENV_VAR: &str = "RACESHEET_SHORT_COOLDOWN_MINUTES";
/// Daily quota reset hour override (local time)
pub const RESET_HOUR_ENV_VAR: &str = "RACESHEET_RESET_HOUR";

/// Longest short-quota cooldown accepted (one day)
pub const MAX_SHORT_COOLDOWN_MINUTES: i64 = 24 * 60;

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub sheets: SheetsConfig,
    pub quota: QuotaConfig,
    pub extraction: ExtractionConfig,
    pub store: StoreConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Worksheet names and reference-table regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// Results worksheet holding the race blocks
    pub results: String,
    /// Worksheet with the flat canonical car list
    pub cars: String,
    pub cars_range: String,
    /// Worksheet with the (canonical, alias) car translation table
    pub car_aliases: String,
    pub car_aliases_range: String,
    /// Worksheet with the driver table
    pub drivers: String,
    /// Multi-column region: column 0 = canonical name
    pub drivers_range: String,
    /// Column offset of the team inside `drivers_range`
    pub driver_team_offset: u32,
    /// Single-column alias region, row-aligned with `drivers_range`
    pub driver_aliases_range: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            results: "T".to_string(),
            cars: "DB_tech".to_string(),
            cars_range: "R8:R300".to_string(),
            car_aliases: "Car_Translate".to_string(),
            car_aliases_range: "A2:B1000".to_string(),
            drivers: "DB_drvr".to_string(),
            drivers_range: "C5:K200".to_string(),
            driver_team_offset: 8,
            driver_aliases_range: "DB5:DB200".to_string(),
        }
    }
}

/// Upstream quota backoff policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Local hour at which the daily quota resets
    pub daily_reset_hour: u32,
    /// Cooldown after a short-term rate limit
    pub short_cooldown_minutes: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_reset_hour: 9,
            short_cooldown_minutes: 5,
        }
    }
}

/// When to run a second, verifying extraction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    #[default]
    Never,
    OnDeltaErrors,
    Always,
}

impl VerifyMode {
    /// Parse `0|1|2` or a mode name
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "never" => Some(Self::Never),
            "1" | "on_delta_errors" => Some(Self::OnDeltaErrors),
            "2" | "always" => Some(Self::Always),
            _ => None,
        }
    }
}

/// Extraction configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub verify: VerifyMode,
}

/// Store access configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Pause between individual cell mutations during block relocation
    pub relocation_pause_ms: u64,
}

impl TomlConfig {
    /// Parse from TOML text and validate
    pub fn from_toml(input: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(input).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges and region syntax
    pub fn validate(&self) -> Result<()> {
        if self.quota.daily_reset_hour > 23 {
            return Err(Error::Config(format!(
                "quota.daily_reset_hour must be 0..=23, got {}",
                self.quota.daily_reset_hour
            )));
        }
        if !(1..=MAX_SHORT_COOLDOWN_MINUTES).contains(&self.quota.short_cooldown_minutes) {
            return Err(Error::Config(format!(
                "quota.short_cooldown_minutes must be 1..={}, got {}",
                MAX_SHORT_COOLDOWN_MINUTES, self.quota.short_cooldown_minutes
            )));
        }

        let s = &self.sheets;
        for (key, value) in [
            ("sheets.cars_range", &s.cars_range),
            ("sheets.car_aliases_range", &s.car_aliases_range),
            ("sheets.driver_aliases_range", &s.driver_aliases_range),
        ] {
            RangeRef::parse(value).map_err(|e| Error::Config(format!("{}: {}", key, e)))?;
        }

        let drivers = RangeRef::parse(&s.drivers_range)
            .map_err(|e| Error::Config(format!("sheets.drivers_range: {}", e)))?;
        if s.driver_team_offset >= drivers.width() {
            return Err(Error::Config(format!(
                "sheets.driver_team_offset {} is outside drivers_range {} (width {})",
                s.driver_team_offset,
                drivers,
                drivers.width()
            )));
        }

        Ok(())
    }

    /// Apply individual environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(VERIFY_ENV_VAR) {
            self.extraction.verify = VerifyMode::parse(&value).ok_or_else(|| {
                Error::Config(format!("{}: unknown verify mode '{}'", VERIFY_ENV_VAR, value))
            })?;
        }
        if let Ok(value) = std::env::var(SHORT_COOLDOWN_ENV_VAR) {
            self.quota.short_cooldown_minutes = value.trim().parse().map_err(|_| {
                Error::Config(format!("{}: not a number: '{}'", SHORT_COOLDOWN_ENV_VAR, value))
            })?;
        }
        if let Ok(value) = std::env::var(RESET_HOUR_ENV_VAR) {
            self.quota.daily_reset_hour = value.trim().parse().map_err(|_| {
                Error::Config(format!("{}: not a number: '{}'", RESET_HOUR_ENV_VAR, value))
            })?;
        }
        Ok(())
    }
}

/// Where the config file was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserConfigDir(PathBuf),
    Defaults,
}

/// Resolve the config file location per priority order.
///
/// Explicit locations (CLI, ENV) are returned even if the file does not
/// exist, so the caller can report them; the OS config dir is only used when
/// the file is present.
pub fn resolve_config_source(cli_arg: Option<&Path>) -> ConfigSource {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return ConfigSource::CommandLine(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return ConfigSource::Environment(PathBuf::from(path));
        }
    }

    // Priority 3: OS config directory
    if let Some(path) = default_config_path() {
        if path.exists() {
            return ConfigSource::UserConfigDir(path);
        }
    }

    // Priority 4: Compiled defaults
    ConfigSource::Defaults
}

/// `<os config dir>/racesheet/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("racesheet").join("config.toml"))
}

/// Load, override, and validate configuration
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let source = resolve_config_source(cli_arg);

    let mut config = match &source {
        ConfigSource::CommandLine(path) => {
            // Explicitly requested: a missing file is an error
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Read config {} failed: {}", path.display(), e))
            })?;
            info!("Config loaded from command line: {}", path.display());
            TomlConfig::from_toml(&content)?
        }
        ConfigSource::Environment(path) | ConfigSource::UserConfigDir(path) => {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    info!("Config loaded from {}", path.display());
                    TomlConfig::from_toml(&content)?
                }
                Err(e) => {
                    warn!(
                        "Config file {} not readable ({}), using compiled defaults",
                        path.display(),
                        e
                    );
                    TomlConfig::default()
                }
            }
        }
        ConfigSource::Defaults => {
            warn!("No config file found, using compiled defaults");
            TomlConfig::default()
        }
    };

    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

/// Write config atomically: serialize to `<path>.tmp`, then rename over target
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
