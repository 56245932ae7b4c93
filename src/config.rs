//! Configuration management for the ZwiftPower client.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name used for config directory.
const APP_NAME: &str = "ZwiftPower";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Placeholder value for an unset password.
const PASSWORD_PLACEHOLDER: &str = "YOUR_PASSWORD_HERE";

/// Browser identification sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Login credentials.
    pub account: AccountConfig,

    /// Target site settings.
    pub site: SiteConfig,

    /// Reference data locations.
    pub reference: ReferenceConfig,
}

/// Credentials used by the login flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Zwift account email.
    pub username: String,

    /// Zwift account password.
    pub password: String,

    /// Netscape cookie file exported from a logged-in browser.
    /// When set, the password login is skipped.
    pub cookie_file: Option<PathBuf>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: PASSWORD_PLACEHOLDER.to_string(),
            cookie_file: None,
        }
    }
}

impl AccountConfig {
    /// Checks if a usable password is configured (not placeholder).
    pub fn has_password(&self) -> bool {
        !self.password.is_empty() && self.password != PASSWORD_PLACEHOLDER
    }
}

/// Target site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme and host of the results site, without trailing slash.
    pub base_url: String,

    /// Team whose roster `roster` reports on.
    pub team_id: String,

    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://zwiftpower.com".to_string(),
            team_id: "16219".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Reference data configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// iso-codes `iso_3166-2.json` used instead of the bundled subdivisions.
    pub subdivisions_file: Option<PathBuf>,

    /// JSON file of route ids to route names, merged over the bundled routes.
    pub routes_file: Option<PathBuf>,
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account.cookie_file.is_none() {
            if self.account.username.trim().is_empty() {
                return Err(ConfigError::MissingValue(
                    "account.username (set your Zwift email in config file)".to_string(),
                ));
            }
            if !self.account.has_password() {
                return Err(ConfigError::MissingValue(
                    "account.password (set your Zwift password in config file)".to_string(),
                ));
            }
        }

        if self.site.team_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "site.team_id".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if let Err(e) = url::Url::parse(&self.site.base_url) {
            return Err(ConfigError::InvalidValue {
                key: "site.base_url".to_string(),
                message: e.to_string(),
            });
        }

        Ok(())
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.site.base_url.trim_end_matches('/')
    }
}
