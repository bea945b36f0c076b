use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::data::{LegOutcome, OcoResult, OcoState, OrderResult};
use crate::error::{ErrorHandler, TradingResult, EXIT_OK, EXIT_PARTIAL_OCO};
use crate::exchange::ExchangeClient;
use crate::orders::oco::resolve_percent_prices;
use crate::orders::{CancelOrder, LimitOrder, MarketOrder, OcoOrder};
use crate::validators::{RawOrder, Validator};

#[derive(Debug, Parser)]
#[command(name = "futures-order-bot", version)]
#[command(about = "Place market, limit and OCO orders on Binance USD-M futures (testnet by default)", long_about = None)]
pub struct CommandlineArgs {
    /// TOML config file; environment variables are used when omitted
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Debug-level diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Talk to the live exchange instead of the testnet
    #[arg(long, global = true)]
    pub mainnet: bool,

    /// Directory of the audit log
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Market order
    Market(MarketArgs),
    /// Limit order
    Limit(LimitArgs),
    /// Limit + stop-limit pair
    Oco(OcoArgs),
    /// Cancel an open order by id
    Cancel(CancelArgs),
    /// Check credentials and connectivity
    Status,
}

#[derive(Debug, Args)]
pub struct MarketArgs {
    #[arg(short, long)]
    pub symbol: String,
    #[arg(long)]
    pub side: String,
    #[arg(short, long)]
    pub qty: String,
}

#[derive(Debug, Args)]
pub struct LimitArgs {
    #[arg(short, long)]
    pub symbol: String,
    #[arg(long)]
    pub side: String,
    #[arg(short, long)]
    pub qty: String,
    #[arg(short, long)]
    pub price: String,
    /// GTC, IOC, FOK or GTX
    #[arg(long, default_value = "GTC")]
    pub tif: String,
}

#[derive(Debug, Args)]
pub struct OcoArgs {
    #[arg(short, long)]
    pub symbol: String,
    /// Side of both legs. With --tp-pct/--sl-pct it is the side of the
    /// position being protected and both legs take the opposite side.
    #[arg(long)]
    pub side: String,
    #[arg(short, long)]
    pub qty: String,
    /// Limit (take-profit) leg price
    #[arg(short, long, required_unless_present = "tp_pct")]
    pub price: Option<String>,
    /// Stop leg trigger price
    #[arg(long, required_unless_present = "sl_pct")]
    pub stop_price: Option<String>,
    /// Take-profit distance from the current price, in percent
    #[arg(long, conflicts_with = "price", requires = "sl_pct")]
    pub tp_pct: Option<String>,
    /// Stop-loss distance from the current price, in percent
    #[arg(long, conflicts_with = "stop_price", requires = "tp_pct")]
    pub sl_pct: Option<String>,
}

#[derive(Debug, Args)]
pub struct CancelArgs {
    #[arg(short, long)]
    pub symbol: String,
    #[arg(long)]
    pub order_id: String,
}

/// Runs one command and returns the process exit code.
pub async fn run<C: ExchangeClient + ?Sized>(command: &Command, client: &C) -> i32 {
    match execute(command, client).await {
        Ok(code) => code,
        Err(err) => {
            let msg = ErrorHandler::handle_error(&err);
            println!("Error: {}", msg);
            ErrorHandler::exit_code(&err)
        }
    }
}

async fn execute<C: ExchangeClient + ?Sized>(command: &Command, client: &C) -> TradingResult<i32> {
    match command {
        Command::Market(args) => {
            let req = Validator::order(&RawOrder {
                symbol: args.symbol.clone(),
                side: args.side.clone(),
                order_type: "MARKET".to_string(),
                quantity: args.qty.clone(),
                ..Default::default()
            })?;
            let res = MarketOrder::new(client).place(&req).await?;
            print!("{}", render_result("Market Order", &res));
            Ok(EXIT_OK)
        }
        Command::Limit(args) => {
            let req = Validator::order(&RawOrder {
                symbol: args.symbol.clone(),
                side: args.side.clone(),
                order_type: "LIMIT".to_string(),
                quantity: args.qty.clone(),
                price: Some(args.price.clone()),
                time_in_force: Some(args.tif.clone()),
                ..Default::default()
            })?;
            let res = LimitOrder::new(client).place(&req).await?;
            print!("{}", render_result("Limit Order", &res));
            Ok(EXIT_OK)
        }
        Command::Oco(args) => {
            let (side, price, stop_price) = match (&args.tp_pct, &args.sl_pct) {
                (Some(tp), Some(sl)) => {
                    // everything the user typed is checked before the ticker call
                    let symbol = Validator::validate_symbol(&args.symbol)?;
                    let position = Validator::validate_side(&args.side)?;
                    Validator::validate_quantity(&args.qty)?;
                    let tp = Validator::validate_price("tp_pct", tp)?;
                    let sl = Validator::validate_price("sl_pct", sl)?;
                    let leg_side = position.opposite();
                    let (p, s) = resolve_percent_prices(client, &symbol, leg_side, tp, sl).await?;
                    (leg_side.as_str().to_string(), Some(p.to_string()), Some(s.to_string()))
                }
                _ => (args.side.clone(), args.price.clone(), args.stop_price.clone()),
            };
            let req = Validator::order(&RawOrder {
                symbol: args.symbol.clone(),
                side,
                order_type: "OCO".to_string(),
                quantity: args.qty.clone(),
                price,
                stop_price,
                time_in_force: None,
            })?;
            let res = OcoOrder::new(client).place(&req).await?;
            print!("{}", render_oco(&res));
            Ok(match res.state {
                OcoState::Complete => EXIT_OK,
                OcoState::Partial => EXIT_PARTIAL_OCO,
            })
        }
        Command::Cancel(args) => {
            let res = CancelOrder::new(client).cancel(&args.symbol, &args.order_id).await?;
            print!("{}", render_result("Cancelled Order", &res));
            Ok(EXIT_OK)
        }
        Command::Status => {
            let account = client.account_status().await?;
            print!("{}", render_account(&account));
            Ok(EXIT_OK)
        }
    }
}

fn value_str(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn table(title: &str, rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut out = format!("{}\n{}\n", title, "-".repeat(title.len()));
    for (key, value) in rows {
        out.push_str(&format!("{:<width$}  {}\n", key, value, width = width));
    }
    out.push('\n');
    out
}

pub fn render_result(title: &str, res: &OrderResult) -> String {
    let mut rows: Vec<(&str, String)> = vec![
        ("orderId", res.order_id.clone()),
        ("clientOrderId", res.client_order_id.clone().unwrap_or_default()),
        ("symbol", res.symbol.clone()),
        ("status", res.status.to_string()),
    ];
    for key in ["side", "type", "price", "stopPrice", "origQty", "executedQty", "avgPrice", "timeInForce"] {
        if let Some(v) = res.raw_response.get(key) {
            rows.push((key, value_str(v)));
        }
    }
    rows.push(("timestamp", res.timestamp.to_rfc3339()));
    table(title, &rows)
}

pub fn render_oco(res: &OcoResult) -> String {
    let mut out = render_result("OCO Limit Leg", &res.primary);
    match &res.stop {
        LegOutcome::Placed(stop) => out.push_str(&render_result("OCO Stop Leg", stop)),
        LegOutcome::Failed { error } => {
            out.push_str(&table("OCO Stop Leg", &[("status", "FAILED".to_string()), ("error", error.clone())]));
            out.push_str(&format!(
                "PARTIAL: limit order {} is live without its stop. Cancel it with `cancel --symbol {} --order-id {}` or place a stop manually.\n",
                res.primary.order_id, res.primary.symbol, res.primary.order_id
            ));
        }
    }
    out
}

pub fn render_account(account: &Value) -> String {
    let mut rows: Vec<(&str, String)> = vec![("connection", "OK".to_string())];
    for key in ["canTrade", "totalWalletBalance", "availableBalance", "totalUnrealizedProfit"] {
        if let Some(v) = account.get(key) {
            rows.push((key, value_str(v)));
        }
    }
    table("Account", &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn cli_definition_is_consistent() {
        CommandlineArgs::command().debug_assert();
    }

    #[test]
    fn parses_limit_command() {
        let args = CommandlineArgs::try_parse_from([
            "futures-order-bot", "limit", "--symbol", "BTCUSDT", "--side", "BUY", "--qty", "0.01", "--price", "30000",
        ])
        .unwrap();
        match args.command {
            Command::Limit(l) => {
                assert_eq!(l.symbol, "BTCUSDT");
                assert_eq!(l.price, "30000");
                assert_eq!(l.tif, "GTC");
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(!args.mainnet);
    }

    #[test]
    fn oco_price_modes_are_exclusive() {
        let ok = CommandlineArgs::try_parse_from([
            "futures-order-bot", "oco", "-s", "BTCUSDT", "--side", "SELL", "-q", "0.01", "--tp-pct", "2", "--sl-pct", "1",
        ]);
        assert!(ok.is_ok());

        let clash = CommandlineArgs::try_parse_from([
            "futures-order-bot", "oco", "-s", "BTCUSDT", "--side", "SELL", "-q", "0.01", "--price", "1", "--tp-pct", "2",
            "--sl-pct", "1",
        ]);
        assert!(clash.is_err());

        let missing = CommandlineArgs::try_parse_from([
            "futures-order-bot", "oco", "-s", "BTCUSDT", "--side", "SELL", "-q", "0.01", "--price", "32000",
        ]);
        assert!(missing.is_err());
    }

    #[test]
    fn result_table_shows_exchange_fields() {
        let res = OrderResult::from_response(json!({
            "orderId": 77,
            "clientOrderId": "lmt-1",
            "symbol": "BTCUSDT",
            "status": "NEW",
            "side": "BUY",
            "type": "LIMIT",
            "price": "30000",
            "origQty": "0.01"
        }))
        .unwrap();
        let out = render_result("Limit Order", &res);
        assert!(out.starts_with("Limit Order\n"));
        assert!(out.contains("orderId        77"));
        assert!(out.contains("price          30000"));
    }
}
