use crate::data::OrderResult;
use crate::error::{TradingError, TradingResult};
use crate::exchange::ExchangeClient;
use crate::orders::settle;
use crate::validators::Validator;

/// Explicit cancellation by exchange order id. Nothing else in the crate
/// cancels orders.
pub struct CancelOrder<'a, C: ExchangeClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ExchangeClient + ?Sized> CancelOrder<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn validate_order_id(order_id: &str) -> TradingResult<String> {
        let id = order_id.trim();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(TradingError::validation(
                "order_id",
                format!("'{}' must be a numeric exchange order id", order_id),
            ));
        }
        Ok(id.to_string())
    }

    pub async fn cancel(&self, symbol: &str, order_id: &str) -> TradingResult<OrderResult> {
        let symbol = Validator::validate_symbol(symbol)?;
        let order_id = Self::validate_order_id(order_id)?;
        settle("Cancel", self.client.cancel_order(&symbol, &order_id).await)
    }
}
