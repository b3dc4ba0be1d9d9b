use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use common::models::{OrderOutcome, OrderRequest, PricePoint, SymbolConstraints, Ticker};
use rust_decimal::Decimal;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("exchange answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("cannot sign request: {0}")]
    Signing(String),

    #[error("cannot decode exchange response: {0}")]
    Decode(String),

    #[error("{symbol} has no {filter} filter")]
    MissingFilter { symbol: String, filter: &'static str },

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("no answer within {0:?}")]
    Timeout(Duration),
}

/// Converts a raw exchange payload into a domain value.
pub trait RemoteResponse<T> {
    fn to_domain(&self) -> Result<T, GatewayError>;
}

/// Everything the trading pipeline needs from an exchange.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Symbols currently open for trading in the configured quote asset.
    async fn list_trading_symbols(&self) -> Result<Vec<String>, GatewayError>;

    async fn get_constraints(&self, symbol: &str) -> Result<SymbolConstraints, GatewayError>;

    async fn get_price(&self, symbol: &str) -> Result<Decimal, GatewayError>;

    /// Closing prices, oldest first.
    async fn get_price_history(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<PricePoint>, GatewayError>;

    async fn get_market_tickers(&self) -> Result<Vec<Ticker>, GatewayError>;

    /// Submits exactly once. Implementations never retry.
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderOutcome, GatewayError>;
}

/// Bounds a gateway call. An elapsed deadline becomes [`GatewayError::Timeout`].
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| GatewayError::Timeout(timeout))?
}
