use std::collections::HashMap;
use std::fmt::Write;
use std::time::Duration;

use common::models::Ticker;
use rust_decimal::Decimal;
use tracing::debug;

use crate::traits::{ExchangeGateway, GatewayError, with_timeout};

/// Last price and 24h volume for the symbols of this run.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    order: Vec<String>,
    tickers: HashMap<String, Ticker>,
}

impl MarketSnapshot {
    /// Fetches the 24h tickers and keeps the requested symbols, in request order.
    pub async fn refresh(
        gateway: &dyn ExchangeGateway,
        symbols: &[String],
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let tickers = with_timeout(timeout, gateway.get_market_tickers()).await?;
        let snapshot = Self::from_tickers(symbols, tickers);
        debug!("Market snapshot holds {} of {} symbols", snapshot.tickers.len(), symbols.len());
        Ok(snapshot)
    }

    pub fn from_tickers(symbols: &[String], tickers: impl IntoIterator<Item = Ticker>) -> Self {
        let mut by_symbol: HashMap<String, Ticker> = tickers
            .into_iter()
            .map(|t| (t.symbol.to_uppercase(), t))
            .collect();
        by_symbol.retain(|symbol, _| symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol)));

        let order = symbols
            .iter()
            .map(|s| s.to_uppercase())
            .filter(|s| by_symbol.contains_key(s))
            .collect();

        Self {
            order,
            tickers: by_symbol,
        }
    }

    pub fn ticker(&self, symbol: &str) -> Option<&Ticker> {
        self.tickers.get(&symbol.to_uppercase())
    }

    pub fn price(&self, symbol: &str) -> Option<Decimal> {
        self.ticker(symbol).map(|t| t.price)
    }

    /// One `SYMBOL: price=…, volume=…` line per symbol, at most `limit` lines.
    pub fn describe(&self, limit: usize) -> String {
        let mut out = String::new();
        for ticker in self.order.iter().filter_map(|s| self.tickers.get(s)).take(limit) {
            let _ = writeln!(
                out,
                "{}: price={}, volume={}",
                ticker.symbol,
                ticker.price.normalize(),
                ticker.volume.normalize()
            );
        }
        out
    }
}
