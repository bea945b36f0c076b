//! Pre-flight checks on user input. Nothing in here touches the network; an
//! `OrderRequest` only exists once every field has passed.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::data::{OrderRequest, OrderType, Side, SubmissionState, TimeInForce};
use crate::error::{TradingError, TradingResult};

const MAX_SYMBOL_LEN: usize = 20;

/// Order fields exactly as the user typed them.
#[derive(Debug, Clone, Default)]
pub struct RawOrder {
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub quantity: String,
    pub price: Option<String>,
    pub stop_price: Option<String>,
    pub time_in_force: Option<String>,
}

pub struct Validator;

impl Validator {
    /// Validates every field of `raw` and builds the typed request.
    pub fn order(raw: &RawOrder) -> TradingResult<OrderRequest> {
        let symbol = Self::validate_symbol(&raw.symbol)?;
        let side = Self::validate_side(&raw.side)?;
        let order_type = Self::validate_order_type(&raw.order_type)?;
        let quantity = Self::validate_quantity(&raw.quantity)?;

        let price = match (order_type, raw.price.as_deref()) {
            (OrderType::Market, Some(_)) => {
                return Err(TradingError::validation(
                    "price",
                    "market orders do not take a price",
                ))
            }
            (OrderType::Market, None) => None,
            (_, Some(p)) => Some(Self::validate_price("price", p)?),
            (_, None) => {
                return Err(TradingError::validation(
                    "price",
                    format!("required for {} orders", order_type),
                ))
            }
        };

        let stop_price = match (order_type, raw.stop_price.as_deref()) {
            (OrderType::Oco, Some(p)) => Some(Self::validate_price("stop_price", p)?),
            (OrderType::Oco, None) => {
                return Err(TradingError::validation("stop_price", "required for OCO orders"))
            }
            (_, Some(_)) => {
                return Err(TradingError::validation(
                    "stop_price",
                    format!("not used by {} orders", order_type),
                ))
            }
            (_, None) => None,
        };

        if let (Some(limit), Some(stop)) = (price, stop_price) {
            Self::validate_oco_geometry(side, limit, stop)?;
        }

        let time_in_force = match raw.time_in_force.as_deref() {
            Some(tif) => Self::validate_time_in_force(tif)?,
            None => TimeInForce::default(),
        };

        tracing::debug!(state = ?SubmissionState::Validated, %symbol, %side, %order_type, %quantity, "Order parameters validated");

        Ok(OrderRequest {
            symbol,
            side,
            order_type,
            quantity,
            price,
            stop_price,
            time_in_force,
        })
    }

    pub fn validate_symbol(symbol: &str) -> TradingResult<String> {
        if symbol.is_empty() {
            return Err(TradingError::validation("symbol", "must not be empty"));
        }
        if symbol.len() > MAX_SYMBOL_LEN {
            return Err(TradingError::validation(
                "symbol",
                format!("'{}' is longer than {} characters", symbol, MAX_SYMBOL_LEN),
            ));
        }
        let well_formed = symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            && symbol.chars().any(|c| c.is_ascii_uppercase());
        if !well_formed {
            return Err(TradingError::validation(
                "symbol",
                format!("'{}' must be uppercase alphanumeric, e.g. BTCUSDT", symbol),
            ));
        }
        Ok(symbol.to_string())
    }

    pub fn validate_side(side: &str) -> TradingResult<Side> {
        match side.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            _ => Err(TradingError::validation(
                "side",
                format!("'{}' must be BUY or SELL", side),
            )),
        }
    }

    pub fn validate_order_type(order_type: &str) -> TradingResult<OrderType> {
        match order_type.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            "OCO" => Ok(OrderType::Oco),
            _ => Err(TradingError::validation(
                "type",
                format!("'{}' must be MARKET, LIMIT or OCO", order_type),
            )),
        }
    }

    pub fn validate_quantity(quantity: &str) -> TradingResult<Decimal> {
        Self::positive_decimal("quantity", quantity)
    }

    pub fn validate_price(field: &'static str, price: &str) -> TradingResult<Decimal> {
        Self::positive_decimal(field, price)
    }

    pub fn validate_time_in_force(tif: &str) -> TradingResult<TimeInForce> {
        match tif.trim().to_ascii_uppercase().as_str() {
            "GTC" => Ok(TimeInForce::GTC),
            "IOC" => Ok(TimeInForce::IOC),
            "FOK" => Ok(TimeInForce::FOK),
            "GTX" => Ok(TimeInForce::GTX),
            _ => Err(TradingError::validation(
                "time_in_force",
                format!("'{}' must be one of GTC, IOC, FOK, GTX", tif),
            )),
        }
    }

    /// A SELL pair takes profit above and stops out below; a BUY pair the
    /// reverse. Anything else would trigger the stop leg immediately.
    pub fn validate_oco_geometry(side: Side, limit: Decimal, stop: Decimal) -> TradingResult<()> {
        match side {
            Side::Sell if limit <= stop => Err(TradingError::validation(
                "stop_price",
                format!("for a SELL pair the stop ({}) must be below the limit price ({})", stop, limit),
            )),
            Side::Buy if limit >= stop => Err(TradingError::validation(
                "stop_price",
                format!("for a BUY pair the stop ({}) must be above the limit price ({})", stop, limit),
            )),
            _ => Ok(()),
        }
    }

    /// Percentage inputs for the mark-price OCO mode.
    pub fn validate_percent(field: &'static str, pct: Decimal) -> TradingResult<Decimal> {
        if pct <= Decimal::ZERO || pct >= Decimal::ONE_HUNDRED {
            return Err(TradingError::validation(
                field,
                format!("{} must be between 0 and 100 exclusive", pct),
            ));
        }
        Ok(pct)
    }

    fn positive_decimal(field: &'static str, input: &str) -> TradingResult<Decimal> {
        let value = Decimal::from_str(input.trim()).map_err(|_| {
            TradingError::validation(field, format!("'{}' is not a decimal number", input))
        })?;
        if value <= Decimal::ZERO {
            return Err(TradingError::validation(
                field,
                format!("{} must be greater than zero", value),
            ));
        }
        Ok(value)
    }
}
