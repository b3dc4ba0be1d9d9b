use chrono::{DateTime, Duration, Utc};
use market_data::remote::{AccountInformation, AccountTrade, BinanceClient};
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Assets `holdings` leaves out.
pub const MAJOR_ASSETS: &[&str] = &["BTC", "ETH", "BNB", "USDT", "BUSD", "USDC", "TUSD", "PAX"];

const TRADES_PER_SYMBOL: u16 = 50;

/// Non-zero balances outside [`MAJOR_ASSETS`], largest first.
pub fn minor_holdings(account: &AccountInformation) -> Vec<(String, Decimal)> {
    let mut holdings: Vec<(String, Decimal)> = account
        .balances
        .iter()
        .filter(|b| !MAJOR_ASSETS.contains(&b.asset.as_str()))
        .map(|b| (b.asset.clone(), b.total()))
        .filter(|(_, total)| *total > Decimal::ZERO)
        .collect();
    holdings.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    holdings
}

/// Trades executed at or after `since`, oldest first.
pub fn recent_trades(trades: Vec<AccountTrade>, since: DateTime<Utc>) -> Vec<AccountTrade> {
    let cutoff = since.timestamp_millis();
    let mut recent: Vec<AccountTrade> = trades.into_iter().filter(|t| t.time >= cutoff).collect();
    recent.sort_by_key(|t| t.time);
    recent
}

pub async fn print_holdings(client: &BinanceClient) -> anyhow::Result<()> {
    let account = client.get_account().await?;
    if !account.can_trade {
        warn!("Account cannot trade");
    }

    let holdings = minor_holdings(&account);
    if holdings.is_empty() {
        info!("No holdings outside the major assets");
        return Ok(());
    }
    for (asset, total) in holdings {
        info!("{}: {}", asset, total.normalize());
    }
    Ok(())
}

pub async fn print_trade_history(client: &BinanceClient, symbols: &[String]) -> anyhow::Result<()> {
    let since = Utc::now() - Duration::hours(1);
    let mut printed = 0;

    for symbol in symbols {
        let trades = match client.get_my_trades(symbol, TRADES_PER_SYMBOL).await {
            Ok(trades) => trades,
            Err(e) => {
                warn!("{}: cannot fetch trades: {}", symbol, e);
                continue;
            }
        };
        for trade in recent_trades(trades, since) {
            let at = DateTime::<Utc>::from_timestamp_millis(trade.time).unwrap_or(since);
            info!(
                "{} {} {} {} @ {} (order {})",
                at.format("%H:%M:%S"),
                trade.symbol,
                trade.side(),
                trade.qty.normalize(),
                trade.price.normalize(),
                trade.order_id
            );
            printed += 1;
        }
    }

    info!("{} trades in the last hour across {} symbols", printed, symbols.len());
    Ok(())
}
