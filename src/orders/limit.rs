use crate::data::{LegParams, OrderRequest, OrderResult, OrderType, SubmissionState};
use crate::error::{TradingError, TradingResult};
use crate::exchange::ExchangeClient;
use crate::orders::{client_order_id, expect_type, settle};

pub struct LimitOrder<'a, C: ExchangeClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ExchangeClient + ?Sized> LimitOrder<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn leg(req: &OrderRequest) -> TradingResult<LegParams> {
        let price = req
            .price
            .ok_or_else(|| TradingError::validation("price", "required for LIMIT orders"))?;
        Ok(LegParams {
            client_order_id: client_order_id("lmt"),
            symbol: req.symbol.clone(),
            side: req.side,
            quantity: req.quantity,
            price: Some(price),
            stop_price: None,
            time_in_force: Some(req.time_in_force),
        })
    }

    pub async fn place(&self, req: &OrderRequest) -> TradingResult<OrderResult> {
        expect_type(req, OrderType::Limit)?;
        let leg = Self::leg(req)?;
        tracing::debug!(state = ?SubmissionState::Submitted, client_order_id = %leg.client_order_id, "Limit order");
        settle("Limit", self.client.place_limit_order(&leg).await)
    }
}
