//! Order submitters. Each takes an already validated `OrderRequest`, makes its
//! exchange call(s) and normalizes what comes back.

use serde_json::Value;
use uuid::Uuid;

use crate::data::{OrderRequest, OrderResult, OrderType, SubmissionState};
use crate::error::{TradingError, TradingResult};

pub mod cancel;
pub mod limit;
pub mod market;
pub mod oco;

pub use cancel::CancelOrder;
pub use limit::LimitOrder;
pub use market::MarketOrder;
pub use oco::OcoOrder;

/// Client order ids are capped at 36 characters by the exchange.
pub(crate) fn client_order_id(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..20])
}

pub(crate) fn expect_type(req: &OrderRequest, expected: OrderType) -> TradingResult<()> {
    if req.order_type != expected {
        return Err(TradingError::validation(
            "type",
            format!("{} submitter cannot place a {} order", expected, req.order_type),
        ));
    }
    Ok(())
}

/// Turns the raw outcome of one exchange call into the final result and logs
/// where the request ended up.
pub(crate) fn settle(kind: &str, outcome: TradingResult<Value>) -> TradingResult<OrderResult> {
    let outcome = outcome.and_then(OrderResult::from_response);
    let state = SubmissionState::resolve(&outcome);
    debug_assert!(state.is_terminal());
    match &outcome {
        Ok(res) => tracing::info!(
            ?state,
            order_id = %res.order_id,
            status = %res.status,
            "{} order acknowledged",
            kind
        ),
        Err(err) => tracing::error!(?state, "{} order failed: {}", kind, err),
    }
    outcome
}
