use crate::data::{LegParams, OrderRequest, OrderResult, OrderType, SubmissionState};
use crate::error::TradingResult;
use crate::exchange::ExchangeClient;
use crate::orders::{client_order_id, expect_type, settle};

pub struct MarketOrder<'a, C: ExchangeClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ExchangeClient + ?Sized> MarketOrder<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn leg(req: &OrderRequest) -> LegParams {
        LegParams {
            client_order_id: client_order_id("mkt"),
            symbol: req.symbol.clone(),
            side: req.side,
            quantity: req.quantity,
            price: None,
            stop_price: None,
            time_in_force: None,
        }
    }

    pub async fn place(&self, req: &OrderRequest) -> TradingResult<OrderResult> {
        expect_type(req, OrderType::Market)?;
        let leg = Self::leg(req);
        tracing::debug!(state = ?SubmissionState::Submitted, client_order_id = %leg.client_order_id, "Market order");
        settle("Market", self.client.place_market_order(&leg).await)
    }
}
