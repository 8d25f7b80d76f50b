use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::metering::CostTable;
use crate::models::LOGIN_GRANT;

const APP_DIR: &str = "creditgate";
const DEFAULT_PORT: u16 = 8080;
const DEV_PORT: u16 = 18080;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub metering: MeteringConfig,
    pub inference: InferenceConfig,
    pub hooks: HooksConfig,
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Sessions unused for this long are evicted
    pub session_idle_secs: u64,
    /// How often the idle sweep runs
    pub session_sweep_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: Config::default_port(),
            session_idle_secs: 30 * 60,
            session_sweep_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let file = if Config::is_dev_mode() { "data-dev.db" } else { "data.db" };
        Self {
            path: Config::app_data_dir().join(file),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeteringConfig {
    pub initial_grant: u32,
    pub costs: CostTable,
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self {
            initial_grant: LOGIN_GRANT,
            costs: CostTable::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub completion_model: String,
    pub chat_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            completion_model: "gpt-3.5-turbo-instruct".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            temperature: 0.1,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub enabled: bool,
    pub log_dir: PathBuf,
    pub retention_days: u64,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_dir: Config::app_data_dir().join("usage"),
            retention_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Text unlocked by the reveal action
    pub hidden_text: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            hidden_text: "This is the protected content.".to_string(),
        }
    }
}

impl Config {
    /// Load from `$CREDITGATE_CONFIG` or the per-user config file,
    /// falling back to defaults when neither exists.
    pub fn load() -> Result<Self> {
        let path = std::env::var("CREDITGATE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::app_config_dir().join("config.toml"));

        let mut config = if path.exists() {
            tracing::info!("Loading config from {:?}", path);
            Self::from_file(&path)?
        } else {
            tracing::info!("No config file at {:?}, using defaults", path);
            Self::default()
        };

        if let Ok(key) = std::env::var("CREDITGATE_API_KEY") {
            if !key.is_empty() {
                config.inference.api_key = Some(key);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.metering.costs.validate()?;
        if self.metering.initial_grant == 0 {
            anyhow::bail!("metering.initial_grant must be positive");
        }
        if self.server.session_sweep_secs == 0 {
            anyhow::bail!("server.session_sweep_secs must be positive");
        }
        Ok(())
    }

    pub fn is_dev_mode() -> bool {
        std::env::var("CREDITGATE_DEV").map(|v| v == "1").unwrap_or(false)
    }

    pub fn default_port() -> u16 {
        if Self::is_dev_mode() {
            DEV_PORT
        } else {
            DEFAULT_PORT
        }
    }

    pub fn app_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn app_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn log_dir() -> PathBuf {
        Self::app_config_dir().join("logs")
    }
}
