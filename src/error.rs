use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Exchange API error {code}: {msg}")]
    ExchangeApi { code: i64, msg: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed exchange response: {0}")]
    MalformedResponse(String),

    #[error("Audit log write failed: {0}")]
    Logging(String),
}

impl TradingError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        TradingError::Validation { field, reason: reason.into() }
    }

    /// Maps a Binance `{"code": .., "msg": ..}` error body onto the taxonomy.
    pub fn from_exchange(http_status: u16, code: i64, msg: String) -> Self {
        match code {
            -2014 | -2015 | -1022 => TradingError::Authentication(msg),
            -1003 => TradingError::RateLimit(msg),
            -2018 | -2019 => TradingError::InsufficientBalance(msg),
            _ if http_status == 429 || http_status == 418 => TradingError::RateLimit(msg),
            _ if http_status == 401 => TradingError::Authentication(msg),
            _ => TradingError::ExchangeApi { code, msg },
        }
    }

    /// True when the exchange answered and refused the request, as opposed to
    /// the request never completing.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TradingError::Authentication(_)
                | TradingError::RateLimit(_)
                | TradingError::InsufficientBalance(_)
                | TradingError::ExchangeApi { .. }
        )
    }
}

impl From<reqwest::Error> for TradingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TradingError::Network(format!("Request timeout: {}", err))
        } else if err.is_connect() {
            TradingError::Network(format!("Connection error: {}", err))
        } else if err.is_decode() {
            TradingError::MalformedResponse(format!("Body decode error: {}", err))
        } else {
            TradingError::Network(format!("HTTP error: {}", err))
        }
    }
}

impl From<serde_json::Error> for TradingError {
    fn from(err: serde_json::Error) -> Self {
        TradingError::MalformedResponse(format!("JSON parsing error: {}", err))
    }
}

pub type TradingResult<T> = Result<T, TradingError>;

pub const EXIT_OK: i32 = 0;
pub const EXIT_VALIDATION: i32 = 2;
pub const EXIT_EXCHANGE: i32 = 3;
pub const EXIT_NETWORK: i32 = 4;
pub const EXIT_CONFIGURATION: i32 = 5;
pub const EXIT_PARTIAL_OCO: i32 = 6;

/// Error handling utilities
pub struct ErrorHandler;

impl ErrorHandler {
    /// Log error and return a user-friendly message
    pub fn handle_error(error: &TradingError) -> String {
        match error {
            TradingError::Validation { field, reason } => {
                tracing::warn!(field = *field, "Order validation failed: {}", reason);
            }
            TradingError::RateLimit(msg) => {
                tracing::warn!("Rate limit exceeded: {}", msg);
            }
            TradingError::Logging(msg) => {
                tracing::warn!("Audit log write failed: {}", msg);
            }
            other if other.is_rejection() => {
                tracing::error!("Exchange rejected the request: {}", other);
            }
            other => {
                tracing::error!("{}", other);
            }
        }
        error.to_string()
    }

    pub fn exit_code(error: &TradingError) -> i32 {
        match error {
            TradingError::Validation { .. } => EXIT_VALIDATION,
            TradingError::Configuration(_) => EXIT_CONFIGURATION,
            TradingError::Network(_) => EXIT_NETWORK,
            TradingError::Authentication(_)
            | TradingError::RateLimit(_)
            | TradingError::InsufficientBalance(_)
            | TradingError::ExchangeApi { .. }
            | TradingError::MalformedResponse(_) => EXIT_EXCHANGE,
            // never fatal on its own, but keep the mapping total
            TradingError::Logging(_) => EXIT_OK,
        }
    }
}
