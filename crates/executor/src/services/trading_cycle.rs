//! One pass of the pipeline for one symbol:
//! `Idle -> Signaled -> Validated -> Sized -> Submitted`.
//!
//! HOLD after validation ends the cycle early. Missing data and sizing
//! violations abort it with exactly one notification. Nothing here is retried.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use advisory::services::{AdvisoryValidator, Verdict};
use common::config::ExchangeSettings;
use common::errors::CycleError;
use common::models::{OrderOutcome, OrderQuantity, OrderRequest, PriceWindow, Signal};
use common::notifier::Notifier;
use market_data::services::{MarketSnapshot, SymbolCatalog};
use market_data::traits::{ExchangeGateway, with_timeout};
use strategy::services::SignalEngine;
use tracing::{debug, info, warn};

use crate::services::execution_service::ExecutionService;
use crate::services::order_sizer::OrderSizer;

/// Market lines quoted to the advisory model.
const MARKET_CONTEXT_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Idle,
    Signaled(Signal),
    Validated(Signal),
    Sized(OrderQuantity),
    Submitted,
}

#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Held { verdict: Verdict },
    Filled { request: OrderRequest, outcome: OrderOutcome },
    /// Accepted by the exchange without any execution (`NEW`, `EXPIRED`, ...).
    Unfilled { request: OrderRequest, outcome: OrderOutcome },
    Rejected { request: OrderRequest, outcome: OrderOutcome },
    Aborted(CycleError),
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Held { .. } => "held",
            CycleOutcome::Filled { .. } => "filled",
            CycleOutcome::Unfilled { .. } => "unfilled",
            CycleOutcome::Rejected { .. } => "rejected",
            CycleOutcome::Aborted(_) => "aborted",
        }
    }
}

pub struct TradingCycle {
    gateway: Arc<dyn ExchangeGateway>,
    catalog: Arc<SymbolCatalog>,
    snapshot: Arc<MarketSnapshot>,
    engine: SignalEngine,
    validator: Option<AdvisoryValidator>,
    executor: ExecutionService,
    notifier: Arc<dyn Notifier>,
    interval: String,
    history_limit: u16,
    timeout: Duration,
}

impl TradingCycle {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        catalog: Arc<SymbolCatalog>,
        snapshot: Arc<MarketSnapshot>,
        engine: SignalEngine,
        executor: ExecutionService,
        notifier: Arc<dyn Notifier>,
        settings: &ExchangeSettings,
    ) -> Self {
        Self {
            gateway,
            catalog,
            snapshot,
            engine,
            validator: None,
            executor,
            notifier,
            interval: settings.kline_interval.clone(),
            history_limit: settings.kline_limit,
            timeout: settings.timeout,
        }
    }

    /// Without a validator every technical signal is final.
    pub fn with_validator(mut self, validator: AdvisoryValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub async fn run(&self, symbol: &str) -> CycleOutcome {
        match self.drive(symbol).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{}", e);
                self.notifier.notify(format!("⚠️ cycle aborted: {e}"));
                CycleOutcome::Aborted(e)
            }
        }
    }

    async fn drive(&self, symbol: &str) -> Result<CycleOutcome, CycleError> {
        let mut stage = CycleStage::Idle;

        let points = with_timeout(
            self.timeout,
            self.gateway
                .get_price_history(symbol, &self.interval, self.history_limit),
        )
        .await
        .map_err(|e| CycleError::data_unavailable(symbol, format!("price history: {e}")))?;
        let window = PriceWindow::from_points(usize::from(self.history_limit), points);

        let signal = self.engine.evaluate(&window);
        advance(symbol, &mut stage, CycleStage::Signaled(signal));

        let verdict = match &self.validator {
            Some(validator) => {
                validator
                    .validate(symbol, signal, &self.context(symbol, &window))
                    .await
            }
            None => Verdict::passthrough(signal),
        };
        advance(symbol, &mut stage, CycleStage::Validated(verdict.signal));

        let Some(side) = verdict.signal.side() else {
            info!("{}: HOLD, nothing to do", symbol);
            return Ok(CycleOutcome::Held { verdict });
        };

        let constraints = self.catalog.constraints(symbol)?;
        let price = with_timeout(self.timeout, self.gateway.get_price(symbol))
            .await
            .map_err(|e| CycleError::data_unavailable(symbol, format!("live price: {e}")))?;

        let quantity = OrderSizer::size(price, constraints).map_err(|source| {
            CycleError::SizingViolation {
                symbol: symbol.to_string(),
                source,
            }
        })?;
        advance(symbol, &mut stage, CycleStage::Sized(quantity));

        let request = OrderRequest::new(symbol, side, quantity);
        let outcome = self.executor.execute(request.clone()).await;
        advance(symbol, &mut stage, CycleStage::Submitted);

        Ok(if outcome.is_filled() {
            CycleOutcome::Filled { request, outcome }
        } else if outcome.accepted {
            CycleOutcome::Unfilled { request, outcome }
        } else {
            CycleOutcome::Rejected { request, outcome }
        })
    }

    fn context(&self, symbol: &str, window: &PriceWindow) -> String {
        let mut context = String::new();
        if let Some(indicators) = self.engine.indicators(window) {
            let _ = writeln!(
                context,
                "{}: momentum={:.4}, ema_spread={:.6}, last={}",
                symbol, indicators.momentum, indicators.spread, indicators.last_price
            );
        }
        context.push_str(&self.snapshot.describe(MARKET_CONTEXT_LINES));
        context
    }
}

fn advance(symbol: &str, stage: &mut CycleStage, next: CycleStage) {
    debug!("{}: {:?} -> {:?}", symbol, stage, next);
    *stage = next;
}
