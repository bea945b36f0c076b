use rust_decimal::Decimal;

use crate::data::{
    LegOutcome, LegParams, OcoResult, OcoState, OrderRequest, OrderType, Side,
    SubmissionState, TimeInForce,
};
use crate::error::{TradingError, TradingResult};
use crate::exchange::ExchangeClient;
use crate::orders::{client_order_id, expect_type, settle};
use crate::validators::Validator;

/// Limit leg plus stop-limit leg, sent in that order.
///
/// If the stop leg fails after the limit leg was accepted the result is
/// `OcoState::Partial` and the limit leg stays on the book. Cancelling it is
/// left to the operator (`cancel` command).
pub struct OcoOrder<'a, C: ExchangeClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ExchangeClient + ?Sized> OcoOrder<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Both legs share the side and a common client id so they can be matched
    /// up on the exchange.
    pub fn legs(req: &OrderRequest) -> TradingResult<(LegParams, LegParams)> {
        let price = req
            .price
            .ok_or_else(|| TradingError::validation("price", "required for OCO orders"))?;
        let stop = req
            .stop_price
            .ok_or_else(|| TradingError::validation("stop_price", "required for OCO orders"))?;

        let link = client_order_id("oco");
        let primary = LegParams {
            client_order_id: format!("{}-L", link),
            symbol: req.symbol.clone(),
            side: req.side,
            quantity: req.quantity,
            price: Some(price),
            stop_price: None,
            time_in_force: Some(req.time_in_force),
        };
        let stop_leg = LegParams {
            client_order_id: format!("{}-S", link),
            symbol: req.symbol.clone(),
            side: req.side,
            quantity: req.quantity,
            price: Some(stop),
            stop_price: Some(stop),
            time_in_force: Some(TimeInForce::GTC),
        };
        Ok((primary, stop_leg))
    }

    pub async fn place(&self, req: &OrderRequest) -> TradingResult<OcoResult> {
        expect_type(req, OrderType::Oco)?;
        let (primary_leg, stop_leg) = Self::legs(req)?;
        tracing::info!(
            state = ?SubmissionState::Submitted,
            "OCO setup for {} {}: qty {} | limit {:?} | stop {:?}",
            req.symbol, req.side, req.quantity, primary_leg.price, stop_leg.stop_price
        );

        let legs = self
            .client
            .place_oco_order(&primary_leg, &stop_leg)
            .await
            .map_err(|err| {
                tracing::error!("OCO primary leg failed, stop leg not sent: {}", err);
                err
            })?;
        let primary = legs.primary;
        tracing::info!(
            state = ?SubmissionState::Acknowledged,
            order_id = %primary.order_id,
            status = %primary.status,
            "OCO primary order acknowledged"
        );

        let (state, stop) = match settle("OCO stop", legs.stop) {
            Ok(res) => (OcoState::Complete, LegOutcome::Placed(res)),
            Err(err) => {
                tracing::warn!(
                    "OCO stop leg failed, limit order {} is still open and must be reconciled manually",
                    primary.order_id
                );
                (OcoState::Partial, LegOutcome::Failed { error: err.to_string() })
            }
        };

        Ok(OcoResult { state, primary, stop })
    }
}

/// Derives the limit and stop prices of a pair from the current price and
/// take-profit / stop-loss percentages. SELL legs close a long: profit above,
/// stop below. BUY legs close a short: the reverse.
pub fn prices_from_percent(
    side: Side,
    mark: Decimal,
    tp_pct: Decimal,
    sl_pct: Decimal,
) -> TradingResult<(Decimal, Decimal)> {
    if mark <= Decimal::ZERO {
        return Err(TradingError::MalformedResponse(format!("non-positive ticker price {}", mark)));
    }
    let tp_pct = Validator::validate_percent("tp_pct", tp_pct)?;
    let sl_pct = Validator::validate_percent("sl_pct", sl_pct)?;

    let hundred = Decimal::ONE_HUNDRED;
    let (price, stop) = match side {
        Side::Sell => (
            mark * (hundred + tp_pct) / hundred,
            mark * (hundred - sl_pct) / hundred,
        ),
        Side::Buy => (
            mark * (hundred - tp_pct) / hundred,
            mark * (hundred + sl_pct) / hundred,
        ),
    };

    // keep the tick precision of the quoted price
    let dp = mark.scale();
    let (price, stop) = (price.round_dp(dp), stop.round_dp(dp));
    Validator::validate_oco_geometry(side, price, stop)?;
    if stop <= Decimal::ZERO || price <= Decimal::ZERO {
        return Err(TradingError::validation("sl_pct", "derived prices must stay positive"));
    }
    Ok((price, stop))
}

/// Fetches the current price once and returns `(price, stop_price)`.
pub async fn resolve_percent_prices<C: ExchangeClient + ?Sized>(
    client: &C,
    symbol: &str,
    side: Side,
    tp_pct: Decimal,
    sl_pct: Decimal,
) -> TradingResult<(Decimal, Decimal)> {
    let mark = client.ticker_price(symbol).await?;
    tracing::info!("Live {} price: {}", symbol, mark);
    prices_from_percent(side, mark, tp_pct, sl_pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sell_pair_brackets_the_mark() {
        let (price, stop) =
            prices_from_percent(Side::Sell, Decimal::new(3000000, 2), Decimal::new(2, 0), Decimal::new(1, 0)).unwrap();
        assert_eq!(price, Decimal::new(3060000, 2));
        assert_eq!(stop, Decimal::new(2970000, 2));
    }

    #[test]
    fn buy_pair_is_mirrored() {
        let (price, stop) =
            prices_from_percent(Side::Buy, Decimal::new(2000, 0), Decimal::new(5, 0), Decimal::new(5, 1)).unwrap();
        assert_eq!(price, Decimal::new(1900, 0));
        assert_eq!(stop, Decimal::new(2010, 0));
    }

    #[test]
    fn percentages_are_bounded() {
        assert!(prices_from_percent(Side::Sell, Decimal::new(100, 0), Decimal::ZERO, Decimal::ONE).is_err());
        assert!(prices_from_percent(Side::Sell, Decimal::new(100, 0), Decimal::ONE, Decimal::ONE_HUNDRED).is_err());
    }
}
