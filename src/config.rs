use std::{env, fmt};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{TradingError, TradingResult};

pub const TESTNET_BASE_URL: &str = "https://testnet.binancefuture.com";
pub const MAINNET_BASE_URL: &str = "https://fapi.binance.com";

const MAX_RECV_WINDOW: u64 = 60_000;

#[derive(Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub api_key: String,
    pub secret_key: String,
    #[serde(default = "default_testnet")]
    pub testnet: bool,
    /// Overrides the testnet/mainnet endpoint when set.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_recv_window")]
    pub recv_window: u64, // milliseconds
}

// Credentials stay out of Debug output so they never land in a log line.
impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("api_key", &"***")
            .field("secret_key", &"***")
            .field("testnet", &self.testnet)
            .field("base_url", &self.base_url)
            .field("recv_window", &self.recv_window)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_testnet() -> bool {
    true
}

fn default_recv_window() -> u64 {
    5000
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> TradingResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> TradingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API_KEY")
            .ok_or_else(|| TradingError::Configuration("API_KEY not found".to_string()))?;
        let secret_key = lookup("SECRET_KEY")
            .ok_or_else(|| TradingError::Configuration("SECRET_KEY not found".to_string()))?;

        let testnet = match lookup("TESTNET") {
            Some(v) => v
                .parse()
                .map_err(|_| TradingError::Configuration(format!("Invalid TESTNET: {}", v)))?,
            None => default_testnet(),
        };

        let recv_window = match lookup("RECV_WINDOW") {
            Some(v) => v
                .parse()
                .map_err(|_| TradingError::Configuration(format!("Invalid RECV_WINDOW: {}", v)))?,
            None => default_recv_window(),
        };

        let mut logging = LoggingConfig::default();
        if let Some(level) = lookup("LOG_LEVEL") {
            logging.level = level.to_lowercase();
        }
        if let Some(dir) = lookup("LOG_DIR") {
            logging.dir = dir;
        }

        let config = AppConfig {
            exchange: ExchangeConfig {
                api_key,
                secret_key,
                testnet,
                base_url: lookup("FUTURES_BASE_URL"),
                recv_window,
            },
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> TradingResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TradingError::Configuration(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> TradingResult<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| TradingError::Configuration(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TradingResult<()> {
        if self.exchange.api_key.trim().is_empty() {
            return Err(TradingError::Configuration("API key cannot be empty".to_string()));
        }
        if self.exchange.secret_key.trim().is_empty() {
            return Err(TradingError::Configuration("Secret key cannot be empty".to_string()));
        }
        if self.exchange.recv_window == 0 || self.exchange.recv_window > MAX_RECV_WINDOW {
            return Err(TradingError::Configuration(format!(
                "recv_window must be between 1 and {} ms",
                MAX_RECV_WINDOW
            )));
        }
        if let Some(url) = &self.exchange.base_url {
            Url::parse(url)
                .map_err(|e| TradingError::Configuration(format!("Invalid base url '{}': {}", url, e)))?;
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(TradingError::Configuration(format!("Invalid log level: {}", self.logging.level)));
        }
        Ok(())
    }
}

impl ExchangeConfig {
    /// REST endpoint the session talks to, without trailing slash.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if self.testnet => TESTNET_BASE_URL.to_string(),
            None => MAINNET_BASE_URL.to_string(),
        }
    }

    /// True when the resolved endpoint is the live exchange, whatever
    /// `testnet` says.
    pub fn is_mainnet(&self) -> bool {
        self.base_url() == MAINNET_BASE_URL
    }
}
