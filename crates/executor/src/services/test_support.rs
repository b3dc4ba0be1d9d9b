//! Fakes shared by the executor tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use advisory::traits::{AdvisoryError, AdvisoryService};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::models::{OrderOutcome, OrderRequest, PricePoint, SymbolConstraints, Ticker};
use common::notifier::Notifier;
use market_data::traits::{ExchangeGateway, GatewayError};
use mockall::mock;
use rust_decimal::Decimal;

mock! {
    pub Gateway {}

    #[async_trait]
    impl ExchangeGateway for Gateway {
        async fn list_trading_symbols(&self) -> Result<Vec<String>, GatewayError>;
        async fn get_constraints(&self, symbol: &str) -> Result<SymbolConstraints, GatewayError>;
        async fn get_price(&self, symbol: &str) -> Result<Decimal, GatewayError>;
        async fn get_price_history(
            &self,
            symbol: &str,
            interval: &str,
            limit: u16,
        ) -> Result<Vec<PricePoint>, GatewayError>;
        async fn get_market_tickers(&self) -> Result<Vec<Ticker>, GatewayError>;
        async fn submit_order(&self, order: &OrderRequest) -> Result<OrderOutcome, GatewayError>;
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: String) {
        self.messages.lock().unwrap().push(message);
    }
}

/// Replies from a script, one entry per call. An exhausted script hangs.
#[derive(Default)]
pub struct ScriptedAdvisor {
    replies: Mutex<VecDeque<Result<String, AdvisoryError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAdvisor {
    pub fn replying(reply: &str) -> Self {
        let advisor = Self::default();
        advisor.replies.lock().unwrap().push_back(Ok(reply.to_string()));
        advisor
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdvisoryService for ScriptedAdvisor {
    async fn ask(&self, prompt: &str, _timeout: Duration) -> Result<String, AdvisoryError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("HOLD".to_string())
            }
        }
    }
}

/// One hourly close per price, oldest first.
pub fn history(prices: &[Decimal]) -> Vec<PricePoint> {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| PricePoint::new(start + chrono::Duration::hours(i as i64), *price))
        .collect()
}

/// `n` closes rising by `step` from `from`.
pub fn rising(from: Decimal, step: Decimal, n: usize) -> Vec<Decimal> {
    (0..n).map(|i| from + step * Decimal::from(i)).collect()
}
