use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::{TradingError, TradingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
    Oco,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Oco => "OCO",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum TimeInForce {
    #[default]
    GTC,
    IOC,
    FOK,
    /// Post-only on Binance futures.
    GTX,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::GTC => "GTC",
            TimeInForce::IOC => "IOC",
            TimeInForce::FOK => "FOK",
            TimeInForce::GTX => "GTX",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
}

impl FromStr for OrderStatus {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(OrderStatus::New),
            "PARTIALLY_FILLED" => Ok(OrderStatus::PartiallyFilled),
            "FILLED" => Ok(OrderStatus::Filled),
            "CANCELED" => Ok(OrderStatus::Canceled),
            "REJECTED" => Ok(OrderStatus::Rejected),
            "EXPIRED" => Ok(OrderStatus::Expired),
            other => Err(TradingError::MalformedResponse(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// A validated order, built only by `validators::Validator`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub time_in_force: TimeInForce,
}

/// Parameters of a single exchange call. One `OrderRequest` becomes one
/// `LegParams` (market, limit) or two (OCO).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegParams {
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderResult {
    pub order_id: String,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub status: OrderStatus,
    pub raw_response: Value,
    pub timestamp: DateTime<Utc>,
}

impl OrderResult {
    /// Normalizes a raw `/fapi/v1/order` response. The status is taken from the
    /// response only.
    pub fn from_response(raw: Value) -> TradingResult<Self> {
        let order_id = match raw.get("orderId") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                return Err(TradingError::MalformedResponse(
                    "response has no orderId".to_string(),
                ))
            }
        };
        let status = raw
            .get("status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TradingError::MalformedResponse("response has no status".to_string()))?
            .parse::<OrderStatus>()?;
        let client_order_id = raw
            .get("clientOrderId")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let symbol = raw
            .get("symbol")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let timestamp = raw
            .get("updateTime")
            .and_then(|v| v.as_i64())
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now);

        Ok(OrderResult {
            order_id,
            client_order_id,
            symbol,
            status,
            raw_response: raw,
            timestamp,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OcoState {
    Complete,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum LegOutcome {
    Placed(OrderResult),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcoResult {
    pub state: OcoState,
    pub primary: OrderResult,
    pub stop: LegOutcome,
}

/// Lifecycle of one submission. The last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Validated,
    Submitted,
    Acknowledged,
    Rejected,
    NetworkError,
}

impl SubmissionState {
    pub fn resolve(outcome: &TradingResult<OrderResult>) -> Self {
        match outcome {
            Ok(_) => SubmissionState::Acknowledged,
            Err(TradingError::Network(_)) => SubmissionState::NetworkError,
            Err(_) => SubmissionState::Rejected,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Acknowledged | SubmissionState::Rejected | SubmissionState::NetworkError
        )
    }
}
