use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use crate::data::LegParams;
use crate::error::TradingResult;
use crate::exchange::{ExchangeClient, LIMIT, MARKET, STOP};
use crate::journal::{Journal, LogEntry, LogLevel};

/// Wraps a client so that each call leaves exactly one journal entry.
pub struct Audited<C> {
    inner: C,
    journal: Journal,
}

impl<C: ExchangeClient> Audited<C> {
    pub fn new(inner: C, journal: Journal) -> Self {
        Self { inner, journal }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn record<T: Serialize>(&self, operation: &str, request: Value, outcome: &TradingResult<T>) {
        let entry = match outcome {
            Ok(response) => LogEntry::new(
                LogLevel::Info,
                format!("{} ok", operation),
                json!({
                    "operation": operation,
                    "request": request,
                    "response": serde_json::to_value(response).unwrap_or(Value::Null),
                }),
            ),
            Err(err) => LogEntry::new(
                LogLevel::Error,
                format!("{} failed", operation),
                json!({
                    "operation": operation,
                    "request": request,
                    "error": err.to_string(),
                }),
            ),
        };
        self.journal.record(entry);
    }
}

fn leg_json(leg: &LegParams, order_type: &str) -> Value {
    let mut request = serde_json::to_value(leg).unwrap_or(Value::Null);
    if let Value::Object(fields) = &mut request {
        fields.insert("type".to_string(), Value::String(order_type.to_string()));
    }
    request
}

#[async_trait]
impl<C: ExchangeClient> ExchangeClient for Audited<C> {
    async fn place_market_order(&self, leg: &LegParams) -> TradingResult<Value> {
        let outcome = self.inner.place_market_order(leg).await;
        self.record("place_market_order", leg_json(leg, MARKET), &outcome);
        outcome
    }

    async fn place_limit_order(&self, leg: &LegParams) -> TradingResult<Value> {
        let outcome = self.inner.place_limit_order(leg).await;
        self.record("place_limit_order", leg_json(leg, LIMIT), &outcome);
        outcome
    }

    async fn place_stop_order(&self, leg: &LegParams) -> TradingResult<Value> {
        let outcome = self.inner.place_stop_order(leg).await;
        self.record("place_stop_order", leg_json(leg, STOP), &outcome);
        outcome
    }

    async fn cancel_order(&self, symbol: &str, order_id: &str) -> TradingResult<Value> {
        let outcome = self.inner.cancel_order(symbol, order_id).await;
        self.record(
            "cancel_order",
            json!({ "symbol": symbol, "orderId": order_id }),
            &outcome,
        );
        outcome
    }

    async fn ticker_price(&self, symbol: &str) -> TradingResult<Decimal> {
        let outcome = self.inner.ticker_price(symbol).await;
        self.record("ticker_price", json!({ "symbol": symbol }), &outcome);
        outcome
    }

    async fn account_status(&self) -> TradingResult<Value> {
        let outcome = self.inner.account_status().await;
        self.record("account_status", json!({}), &outcome);
        outcome
    }
}
