use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::data::{LegParams, OrderResult};
use crate::error::TradingResult;

pub mod audited;
pub mod binance;

pub use audited::Audited;
pub use binance::BinanceFutures;

/// Exchange order types sent for each leg kind.
pub const MARKET: &str = "MARKET";
pub const LIMIT: &str = "LIMIT";
pub const STOP: &str = "STOP";

/// Outcome of the two legs of an OCO pair. The stop leg is only ever
/// attempted after the primary leg was accepted and its answer parsed.
#[derive(Debug)]
pub struct OcoLegs {
    pub primary: OrderResult,
    pub stop: TradingResult<Value>,
}

/// The authenticated exchange session. Every method is one round trip and
/// returns the exchange's raw answer; nothing is retried.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn place_market_order(&self, leg: &LegParams) -> TradingResult<Value>;
    async fn place_limit_order(&self, leg: &LegParams) -> TradingResult<Value>;
    /// Stop-limit order: triggers at `stop_price`, rests at `price`.
    async fn place_stop_order(&self, leg: &LegParams) -> TradingResult<Value>;
    async fn cancel_order(&self, symbol: &str, order_id: &str) -> TradingResult<Value>;
    async fn ticker_price(&self, symbol: &str) -> TradingResult<Decimal>;
    async fn account_status(&self) -> TradingResult<Value>;

    /// Futures have no atomic OCO endpoint, so the pair is two linked orders
    /// sent one after the other. The stop leg is not sent unless the primary
    /// answer is a well-formed order. A failed stop leg leaves the primary in
    /// place.
    async fn place_oco_order(&self, primary: &LegParams, stop: &LegParams) -> TradingResult<OcoLegs> {
        let primary = OrderResult::from_response(self.place_limit_order(primary).await?)?;
        let stop = self.place_stop_order(stop).await;
        Ok(OcoLegs { primary, stop })
    }
}
