use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::ExchangeConfig;
use crate::data::LegParams;
use crate::error::{TradingError, TradingResult};
use crate::exchange::{ExchangeClient, LIMIT, MARKET, STOP};
use crate::sign::{query_string, redact_query, signature};

const ORDER_PATH: &str = "/fapi/v1/order";
const TICKER_PATH: &str = "/fapi/v1/ticker/price";
const ACCOUNT_PATH: &str = "/fapi/v2/account";

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

/// USD-M futures REST session.
pub struct BinanceFutures {
    pub http: Client,
    pub base_url: String,
    api_key: String,
    secret_key: String,
    recv_window: u64,
}

impl BinanceFutures {
    pub fn new(cfg: &ExchangeConfig) -> Self {
        let base_url = cfg.base_url();
        info!(testnet = cfg.testnet, "Futures session initialized against {}", base_url);
        Self {
            http: Client::new(),
            base_url,
            api_key: cfg.api_key.clone(),
            secret_key: cfg.secret_key.clone(),
            recv_window: cfg.recv_window,
        }
    }

    fn order_params(leg: &LegParams, order_type: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", leg.symbol.clone()),
            ("side", leg.side.as_str().to_string()),
            ("type", order_type.to_string()),
            ("quantity", leg.quantity.to_string()),
        ];
        if let Some(tif) = leg.time_in_force {
            params.push(("timeInForce", tif.as_str().to_string()));
        }
        if let Some(price) = leg.price {
            params.push(("price", price.to_string()));
        }
        if let Some(stop) = leg.stop_price {
            params.push(("stopPrice", stop.to_string()));
        }
        params.push(("newClientOrderId", leg.client_order_id.clone()));
        params.push(("newOrderRespType", "RESULT".to_string()));
        params
    }

    async fn signed(
        &self,
        method: Method,
        path: &str,
        mut params: Vec<(&'static str, String)>,
    ) -> TradingResult<Value> {
        params.push(("recvWindow", self.recv_window.to_string()));
        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));

        let query = query_string(&params);
        let sign = signature(self.secret_key.as_bytes(), &query);
        let query = format!("{}&signature={}", query, sign);
        debug!("{} {}?{}", method, path, redact_query(&query));

        let url = format!("{}{}?{}", self.base_url, path, query);
        let response = self
            .http
            .request(method, url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn public(&self, path: &str, params: Vec<(&'static str, String)>) -> TradingResult<Value> {
        let query = query_string(&params);
        debug!("GET {}?{}", path, query);
        let url = format!("{}{}?{}", self.base_url, path, query);
        let response = self.http.get(url).send().await?;
        Self::decode(response).await
    }

    async fn decode(response: Response) -> TradingResult<Value> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiError>(&body) {
                Ok(err) => TradingError::from_exchange(status.as_u16(), err.code, err.msg),
                // gateway or maintenance page, the exchange never saw the request
                Err(_) if status.is_server_error() => {
                    TradingError::Network(format!("HTTP {} from upstream", status))
                }
                Err(_) => TradingError::from_exchange(status.as_u16(), 0, format!("HTTP {}: {}", status, body)),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ExchangeClient for BinanceFutures {
    async fn place_market_order(&self, leg: &LegParams) -> TradingResult<Value> {
        info!("Placing market order {} {} {}", leg.side, leg.quantity, leg.symbol);
        self.signed(Method::POST, ORDER_PATH, Self::order_params(leg, MARKET)).await
    }

    async fn place_limit_order(&self, leg: &LegParams) -> TradingResult<Value> {
        info!(
            "Placing limit order {} {} {} @ {:?}",
            leg.side, leg.quantity, leg.symbol, leg.price
        );
        self.signed(Method::POST, ORDER_PATH, Self::order_params(leg, LIMIT)).await
    }

    async fn place_stop_order(&self, leg: &LegParams) -> TradingResult<Value> {
        info!(
            "Placing stop order {} {} {} trigger {:?} limit {:?}",
            leg.side, leg.quantity, leg.symbol, leg.stop_price, leg.price
        );
        self.signed(Method::POST, ORDER_PATH, Self::order_params(leg, STOP)).await
    }

    async fn cancel_order(&self, symbol: &str, order_id: &str) -> TradingResult<Value> {
        info!("Cancelling order {} on {}", order_id, symbol);
        let params = vec![("symbol", symbol.to_string()), ("orderId", order_id.to_string())];
        self.signed(Method::DELETE, ORDER_PATH, params).await
    }

    async fn ticker_price(&self, symbol: &str) -> TradingResult<Decimal> {
        let ticker = self.public(TICKER_PATH, vec![("symbol", symbol.to_string())]).await?;
        let price = ticker
            .get("price")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TradingError::MalformedResponse("ticker has no price".to_string()))?;
        Decimal::from_str(price)
            .map_err(|e| TradingError::MalformedResponse(format!("ticker price '{}': {}", price, e)))
    }

    async fn account_status(&self) -> TradingResult<Value> {
        self.signed(Method::GET, ACCOUNT_PATH, Vec::new()).await
    }
}
