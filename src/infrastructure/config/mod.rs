//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::services::connection_service::RetryPolicy;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub apex: ApexConfig,
    pub control: ControlConfig,
    pub panel: PanelConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub max_init_attempts: u32,
    pub retry_delay_secs: u64,
}

/// Remote APEX REST endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApexConfig {
    /// Base for `clientes/...` and `ventas/articulos`
    pub base_url: String,
    /// Full URL of the login endpoint
    pub auth_url: String,
    pub timeout_secs: u64,
    /// Default company code for the article report
    pub company: String,
}

/// Control API server
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ControlConfig {
    pub host: String,
    pub port: u16,
}

/// Operator panel client
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PanelConfig {
    /// Base URL of the control API, e.g. `http://localhost:3001/api`
    pub api_url: String,
    /// Directory holding the persisted session
    pub data_dir: PathBuf,
    pub poll_interval_secs: u64,
    pub expiry_check_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Report the session ready right after the pairing code
    pub auto_pair: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "apex-bot".to_string(),
                max_init_attempts: 3,
                retry_delay_secs: 5,
            },
            apex: ApexConfig {
                base_url: "https://oracleapex.com/ords/josegalvez".to_string(),
                auth_url: "https://oracleapex.com/ords/josegalvez/login/auth/login".to_string(),
                timeout_secs: 30,
                company: "24".to_string(),
            },
            control: ControlConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            panel: PanelConfig {
                api_url: "http://localhost:3001/api".to_string(),
                data_dir: PathBuf::from(".apex-bot"),
                poll_interval_secs: 3,
                expiry_check_secs: 60,
            },
            adapters: AdaptersConfig {
                console: Some(ConsoleConfig {
                    enabled: true,
                    auto_pair: false,
                }),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.with_env()
    }

    pub fn load_env() -> Result<Self, ConfigError> {
        // Load from environment variables
        Config::default().with_env()
    }

    /// Apply environment overrides, then validate the result
    fn with_env(mut self) -> Result<Self, ConfigError> {
        self.apply_env();
        self.validate()?;
        Ok(self)
    }

    /// Environment overrides on top of file or default values
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("APEX_BASE_URL") {
            self.apex.base_url = url;
        }

        if let Ok(url) = std::env::var("APEX_AUTH_URL") {
            self.apex.auth_url = url;
        }

        if let Ok(port) = std::env::var("CONTROL_PORT") {
            match port.parse() {
                Ok(port) => self.control.port = port,
                Err(_) => tracing::warn!("Ignoring invalid CONTROL_PORT: {}", port),
            }
        }

        if let Ok(dir) = std::env::var("BOT_DATA_DIR") {
            self.panel.data_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.apex.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("apex.base-url".to_string()));
        }
        if self.apex.auth_url.trim().is_empty() {
            return Err(ConfigError::MissingField("apex.auth-url".to_string()));
        }
        if self.panel.poll_interval_secs == 0 || self.panel.expiry_check_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "panel intervals must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.bot.max_init_attempts,
            Duration::from_secs(self.bot.retry_delay_secs),
        )
    }

    pub fn console_auto_pair(&self) -> bool {
        self.adapters
            .console
            .as_ref()
            .map(|c| c.enabled && c.auto_pair)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(yaml.contains("base-url"));
        assert!(yaml.contains("max-init-attempts"));

        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.control.port, 3001);
        assert_eq!(parsed.panel.poll_interval_secs, 3);
    }

    #[test]
    fn retry_policy_from_bot_section() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn validate_rejects_blank_endpoint() {
        let mut config = Config::default();
        config.apex.base_url = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingField(_))));

        let mut config = Config::default();
        config.panel.poll_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn env_layer_validates_before_use() {
        let mut config = Config::default();
        config.apex.base_url = String::new();
        config.apex.auth_url = String::new();
        if std::env::var("APEX_BASE_URL").is_err() {
            assert!(matches!(config.clone().with_env(), Err(ConfigError::MissingField(_))));
        }

        let mut config = Config::default();
        config.panel.expiry_check_secs = 0;
        assert!(matches!(config.with_env(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        assert!(matches!(Config::from_yaml("bot: ["), Err(ConfigError::Parse(_))));
    }
}
