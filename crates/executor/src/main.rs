use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use dotenvy::dotenv;
use futures_util::{StreamExt, stream};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use advisory::remote::OllamaClient;
use advisory::services::AdvisoryValidator;
use common::config::Settings;
use common::logger;
use common::notifier::{ChannelNotifier, Notifier};
use market_data::remote::BinanceClient;
use market_data::services::{MarketSnapshot, SymbolCatalog};
use market_data::traits::{ExchangeGateway, with_timeout};
use strategy::services::SignalEngine;

use crate::services::audit_log::AuditLog;
use crate::services::execution_service::ExecutionService;
use crate::services::reports;
use crate::services::telegram_service::TelegramService;
use crate::services::trading_cycle::TradingCycle;

mod services;

const NOTIFY_CHANNEL_CAPACITY: usize = 256;
const TELEGRAM_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    let settings = Settings::from_env()?;
    let command = env::args().nth(1).unwrap_or_else(|| "trade".to_string());

    match command.as_str() {
        "trade" => run_trading(settings).await,
        "holdings" => {
            let client = BinanceClient::new(&settings.exchange)?;
            reports::print_holdings(&client).await
        }
        "history" => {
            let client = BinanceClient::new(&settings.exchange)?;
            let symbols = with_timeout(settings.exchange.timeout, client.list_trading_symbols())
                .await
                .context("listing symbols")?;
            let symbols: Vec<String> = symbols.into_iter().take(settings.exchange.max_symbols).collect();
            reports::print_trade_history(&client, &symbols).await
        }
        other => bail!("unknown command {other:?}, expected trade, holdings or history"),
    }
}

async fn run_trading(settings: Settings) -> anyhow::Result<()> {
    let (notify_tx, _) = broadcast::channel::<String>(NOTIFY_CHANNEL_CAPACITY);
    let telegram = settings.telegram.as_ref().map(|telegram| {
        let rx = notify_tx.subscribe();
        tokio::spawn(TelegramService::new(telegram).start(rx))
    });
    if telegram.is_none() {
        info!("Telegram not configured, notifications go to the log only");
    }
    let notifier: Arc<dyn Notifier> = Arc::new(ChannelNotifier::new(notify_tx.clone()));

    let gateway: Arc<dyn ExchangeGateway> = Arc::new(BinanceClient::new(&settings.exchange)?);
    let timeout = settings.exchange.timeout;

    let catalog = SymbolCatalog::load(gateway.as_ref(), settings.exchange.max_symbols, timeout)
        .await
        .context("loading symbol catalog")?;
    let symbols = catalog.symbols().to_vec();
    if symbols.is_empty() {
        warn!("No {} symbols open for trading", settings.exchange.quote_asset);
    }

    let snapshot = match MarketSnapshot::refresh(gateway.as_ref(), &symbols, timeout).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Market snapshot unavailable, advisory context will be thin: {}", e);
            MarketSnapshot::default()
        }
    };

    let engine = SignalEngine::new(settings.signal.clone())?;
    let audit = settings
        .audit_log_path
        .as_ref()
        .map(|path| Arc::new(AuditLog::new(path.clone())));
    let executor = ExecutionService::new(gateway.clone(), notifier.clone(), audit, timeout);

    let mut cycle = TradingCycle::new(
        gateway,
        Arc::new(catalog),
        Arc::new(snapshot),
        engine,
        executor,
        notifier.clone(),
        &settings.exchange,
    );
    if settings.advisory.enabled {
        let client = OllamaClient::new(&settings.advisory)?;
        if !client.is_available().await {
            warn!("Advisory model unreachable, technical signals will stand");
        }
        cycle = cycle.with_validator(AdvisoryValidator::new(
            Arc::new(client),
            notifier.clone(),
            settings.advisory.timeout,
        ));
    } else {
        info!("Advisory gate disabled");
    }

    info!("Trading run over {} symbols", symbols.len());
    let outcomes: Vec<_> = stream::iter(symbols.iter())
        .map(|symbol| cycle.run(symbol))
        .buffer_unordered(settings.cycle_concurrency)
        .collect()
        .await;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for outcome in &outcomes {
        *counts.entry(outcome.label()).or_default() += 1;
    }
    let summary = counts
        .iter()
        .map(|(label, n)| format!("{label}={n}"))
        .collect::<Vec<_>>()
        .join(", ");
    info!("Run finished: {} symbols ({})", outcomes.len(), summary);
    notifier.notify(format!("📊 Run finished: {} symbols ({})", outcomes.len(), summary));

    drop(cycle);
    drop(notifier);
    drop(notify_tx);
    if let Some(handle) = telegram {
        match tokio::time::timeout(TELEGRAM_DRAIN_TIMEOUT, handle).await {
            Ok(Ok(delivery)) if delivery.failed > 0 || delivery.dropped > 0 => {
                warn!("{} notifications never reached Telegram", delivery.failed as u64 + delivery.dropped);
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Telegram relay task failed: {}", e),
            Err(_) => warn!("Telegram delivery did not finish in time"),
        }
    }
    Ok(())
}
