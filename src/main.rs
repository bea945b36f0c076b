use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use futures_order_bot::cli::{self, CommandlineArgs};
use futures_order_bot::config::AppConfig;
use futures_order_bot::error::{ErrorHandler, EXIT_CONFIGURATION};
use futures_order_bot::exchange::{Audited, BinanceFutures};
use futures_order_bot::journal::{AuditSink, FileSink, Journal, StderrSink};
use futures_order_bot::logging::init_tracing;

fn main() {
    let args = CommandlineArgs::parse();
    let code = match bootstrap(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    std::process::exit(code);
}

fn bootstrap(args: CommandlineArgs) -> anyhow::Result<i32> {
    let loaded = match &args.config {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::from_env(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(err) => {
            init_tracing("info", args.verbose);
            println!("Error: {}", ErrorHandler::handle_error(&err));
            return Ok(EXIT_CONFIGURATION);
        }
    };
    if args.mainnet {
        config.exchange.testnet = false;
    }
    if let Some(dir) = &args.log_dir {
        config.logging.dir = dir.clone();
    }

    init_tracing(&config.logging.level, args.verbose);
    let base_url = config.exchange.base_url();
    if args.mainnet && config.exchange.base_url.is_some() {
        tracing::warn!("--mainnet ignored, the configured endpoint {} is used", base_url);
    }
    if config.exchange.is_mainnet() {
        tracing::warn!("LIVE trading against {}", base_url);
    } else {
        tracing::info!("Using futures endpoint {}", base_url);
    }

    let sink: Arc<dyn AuditSink> = match FileSink::open_daily(&config.logging.dir) {
        Ok(sink) => {
            tracing::debug!("Audit log at {}", sink.path().display());
            Arc::new(sink)
        }
        Err(err) => {
            eprintln!("Audit log unavailable ({}), writing audit entries to stderr", err);
            Arc::new(StderrSink)
        }
    };
    let client = Audited::new(BinanceFutures::new(&config.exchange), Journal::new(sink));

    // one request in flight at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    Ok(runtime.block_on(cli::run(&args.command, &client)))
}
