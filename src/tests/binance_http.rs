use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use crate::config::ExchangeConfig;
use crate::data::{LegParams, Side, TimeInForce};
use crate::error::TradingError;
use crate::exchange::{BinanceFutures, ExchangeClient};
use crate::sign::signature;

const KEY: &str = "test-api-key";
const SECRET: &str = "test-secret-key";

fn session(server: &MockServer) -> BinanceFutures {
    BinanceFutures::new(&ExchangeConfig {
        api_key: KEY.to_string(),
        secret_key: SECRET.to_string(),
        testnet: true,
        base_url: Some(server.uri()),
        recv_window: 5000,
    })
}

fn limit_leg() -> LegParams {
    LegParams {
        client_order_id: "lmt-0123456789abcdef0123".to_string(),
        symbol: "BTCUSDT".to_string(),
        side: Side::Buy,
        quantity: Decimal::new(1, 2),
        price: Some(Decimal::new(30000, 0)),
        stop_price: None,
        time_in_force: Some(TimeInForce::GTC),
    }
}

/// The signature must be the HMAC of everything in front of it.
fn correctly_signed(request: &Request) -> bool {
    let query = request.url.query().unwrap_or_default();
    match query.rsplit_once("&signature=") {
        Some((payload, sig)) => signature(SECRET.as_bytes(), payload) == sig,
        None => false,
    }
}

#[tokio::test]
async fn limit_order_is_signed_and_carries_every_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(header("X-MBX-APIKEY", KEY))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("side", "BUY"))
        .and(query_param("type", "LIMIT"))
        .and(query_param("quantity", "0.01"))
        .and(query_param("price", "30000"))
        .and(query_param("timeInForce", "GTC"))
        .and(query_param("recvWindow", "5000"))
        .and(correctly_signed)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orderId": 8389765,
            "clientOrderId": "lmt-0123456789abcdef0123",
            "symbol": "BTCUSDT",
            "status": "NEW"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let raw = session(&server).place_limit_order(&limit_leg()).await.unwrap();
    assert_eq!(raw["orderId"], 8389765);
}

#[tokio::test]
async fn stop_leg_uses_stop_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(query_param("type", "STOP"))
        .and(query_param("stopPrice", "29000"))
        .and(query_param("price", "29000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "orderId": 1, "status": "NEW" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut leg = limit_leg();
    leg.side = Side::Sell;
    leg.price = Some(Decimal::new(29000, 0));
    leg.stop_price = Some(Decimal::new(29000, 0));
    session(&server).place_stop_order(&leg).await.unwrap();
}

#[tokio::test]
async fn error_codes_map_onto_the_taxonomy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("symbol", "AUTHFAIL"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": -2015, "msg": "Invalid API-key, IP, or permissions for action."
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("symbol", "NOFUNDS"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": -2019, "msg": "Margin is insufficient."
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("symbol", "THROTTLED"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("symbol", "BADPRICE"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": -4014, "msg": "Price not increased by tick size."
        })))
        .mount(&server)
        .await;

    let client = session(&server);
    let mut leg = limit_leg();

    leg.symbol = "AUTHFAIL".to_string();
    assert!(matches!(client.place_limit_order(&leg).await, Err(TradingError::Authentication(_))));
    leg.symbol = "NOFUNDS".to_string();
    assert!(matches!(client.place_limit_order(&leg).await, Err(TradingError::InsufficientBalance(_))));
    leg.symbol = "THROTTLED".to_string();
    assert!(matches!(client.place_limit_order(&leg).await, Err(TradingError::RateLimit(_))));
    leg.symbol = "BADPRICE".to_string();
    match client.place_limit_order(&leg).await {
        Err(TradingError::ExchangeApi { code, msg }) => {
            assert_eq!(code, -4014);
            assert!(msg.contains("tick size"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = session(&server).place_market_order(&limit_leg()).await.unwrap_err();
    assert!(matches!(err, TradingError::MalformedResponse(_)));
}

#[tokio::test]
async fn gateway_error_page_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>502 Bad Gateway</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("symbol", "ETHUSDT"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "code": -1008, "msg": "Server is currently overloaded with other requests."
        })))
        .mount(&server)
        .await;

    let client = session(&server);
    let mut leg = limit_leg();
    let err = client.place_limit_order(&leg).await.unwrap_err();
    assert!(matches!(err, TradingError::Network(_)));

    // a coded exchange answer keeps its code even on 5xx
    leg.symbol = "ETHUSDT".to_string();
    let err = client.place_limit_order(&leg).await.unwrap_err();
    assert!(matches!(err, TradingError::ExchangeApi { code: -1008, .. }));
}

#[tokio::test]
async fn cancel_sends_delete_with_order_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/fapi/v1/order"))
        .and(query_param("orderId", "8389765"))
        .and(correctly_signed)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orderId": 8389765, "symbol": "BTCUSDT", "status": "CANCELED"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let raw = session(&server).cancel_order("BTCUSDT", "8389765").await.unwrap();
    assert_eq!(raw["status"], "CANCELED");
}

#[tokio::test]
async fn ticker_is_public_and_parsed_as_decimal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/ticker/price"))
        .and(query_param("symbol", "ETHUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "ETHUSDT", "price": "1834.57", "time": 1700000000000i64
        })))
        .mount(&server)
        .await;

    let price = session(&server).ticker_price("ETHUSDT").await.unwrap();
    assert_eq!(price, Decimal::new(183457, 2));
}

#[tokio::test]
async fn account_status_is_signed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v2/account"))
        .and(header("X-MBX-APIKEY", KEY))
        .and(correctly_signed)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "canTrade": true })))
        .expect(1)
        .mount(&server)
        .await;

    let account = session(&server).account_status().await.unwrap();
    assert_eq!(account["canTrade"], true);
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let client = BinanceFutures::new(&ExchangeConfig {
        api_key: KEY.to_string(),
        secret_key: SECRET.to_string(),
        testnet: true,
        base_url: Some("http://127.0.0.1:9".to_string()),
        recv_window: 5000,
    });
    let err = client.account_status().await.unwrap_err();
    assert!(matches!(err, TradingError::Network(_)));
}
