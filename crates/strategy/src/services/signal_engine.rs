use common::config::SignalSettings;
use common::models::{PriceWindow, Signal};
use rust_decimal::prelude::ToPrimitive;
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum StrategyError {
    #[error("invalid signal settings: {0}")]
    InvalidSettings(String),
}

/// Latest indicator values of a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    /// Simple moving average of the last `momentum_period` closes. It stands
    /// in for a relative strength reading and is compared against the same
    /// oversold/overbought levels, but it is a price average, not an RSI.
    pub momentum: f64,
    /// Fast EMA minus slow EMA.
    pub spread: f64,
    pub last_price: f64,
}

/// Pure BUY/SELL/HOLD rule over a price window.
///
/// The engine keeps pristine indicator instances and clones them for every
/// evaluation, so the same window always yields the same signal.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    settings: SignalSettings,
    momentum: SimpleMovingAverage,
    fast: ExponentialMovingAverage,
    slow: ExponentialMovingAverage,
}

impl SignalEngine {
    pub fn new(settings: SignalSettings) -> Result<Self, StrategyError> {
        if settings.fast_period >= settings.slow_period {
            return Err(StrategyError::InvalidSettings(format!(
                "fast period {} must be shorter than slow period {}",
                settings.fast_period, settings.slow_period
            )));
        }
        if settings.oversold >= settings.overbought {
            return Err(StrategyError::InvalidSettings(format!(
                "oversold level {} must be below overbought level {}",
                settings.oversold, settings.overbought
            )));
        }

        let momentum = SimpleMovingAverage::new(settings.momentum_period)
            .map_err(|_| period_error("momentum", settings.momentum_period))?;
        let fast = ExponentialMovingAverage::new(settings.fast_period)
            .map_err(|_| period_error("fast", settings.fast_period))?;
        let slow = ExponentialMovingAverage::new(settings.slow_period)
            .map_err(|_| period_error("slow", settings.slow_period))?;

        Ok(Self {
            settings,
            momentum,
            fast,
            slow,
        })
    }

    /// Fewer observations than this always produce HOLD.
    pub fn min_observations(&self) -> usize {
        self.settings.momentum_period
    }

    pub fn indicators(&self, window: &PriceWindow) -> Option<IndicatorSnapshot> {
        if window.len() < self.min_observations() {
            return None;
        }

        let mut momentum = self.momentum.clone();
        let mut fast = self.fast.clone();
        let mut slow = self.slow.clone();
        let mut latest = None;

        for point in window.iter() {
            let price = point.price.to_f64()?;
            latest = Some(IndicatorSnapshot {
                momentum: momentum.next(price),
                spread: fast.next(price) - slow.next(price),
                last_price: price,
            });
        }
        latest
    }

    pub fn evaluate(&self, window: &PriceWindow) -> Signal {
        match self.indicators(window) {
            Some(snapshot) => {
                let signal = self.decide(&snapshot);
                debug!(
                    "momentum={:.4} spread={:.6} last={} -> {}",
                    snapshot.momentum, snapshot.spread, snapshot.last_price, signal
                );
                signal
            }
            None => {
                debug!(
                    "{} observations, need {}: HOLD",
                    window.len(),
                    self.min_observations()
                );
                Signal::Hold
            }
        }
    }

    pub fn decide(&self, snapshot: &IndicatorSnapshot) -> Signal {
        if snapshot.momentum < self.settings.oversold && snapshot.spread > 0.0 {
            Signal::Buy
        } else if snapshot.momentum > self.settings.overbought && snapshot.spread < 0.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

fn period_error(name: &str, period: usize) -> StrategyError {
    StrategyError::InvalidSettings(format!("{name} period must be positive, got {period}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use common::models::PricePoint;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn window(prices: &[Decimal]) -> PriceWindow {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        PriceWindow::from_points(
            prices.len().max(1),
            prices
                .iter()
                .enumerate()
                .map(|(i, p)| PricePoint::new(start + Duration::hours(i as i64), *p)),
        )
    }

    fn linear(start: Decimal, step: Decimal, count: usize) -> Vec<Decimal> {
        (0..count).map(|i| start + step * Decimal::from(i)).collect()
    }

    fn engine() -> SignalEngine {
        SignalEngine::new(SignalSettings::default()).unwrap()
    }

    #[test]
    fn short_window_is_hold() {
        let engine = engine();
        for len in 0..engine.min_observations() {
            let prices = linear(dec!(10), dec!(0.5), len);
            assert_eq!(engine.evaluate(&window(&prices)), Signal::Hold, "len {len}");
            assert!(engine.indicators(&window(&prices)).is_none());
        }
    }

    #[test]
    fn low_and_rising_is_buy() {
        let prices = linear(dec!(10), dec!(0.25), 50);
        let engine = engine();

        let snapshot = engine.indicators(&window(&prices)).unwrap();
        assert!(snapshot.momentum < 30.0);
        assert!(snapshot.spread > 0.0);
        assert_eq!(engine.evaluate(&window(&prices)), Signal::Buy);
    }

    #[test]
    fn high_and_falling_is_sell() {
        let prices = linear(dec!(120), dec!(-0.75), 50);
        assert_eq!(engine().evaluate(&window(&prices)), Signal::Sell);
    }

    #[test]
    fn high_and_rising_is_hold() {
        let prices = linear(dec!(80), dec!(1), 50);
        assert_eq!(engine().evaluate(&window(&prices)), Signal::Hold);
    }

    #[test]
    fn low_and_falling_is_hold() {
        let prices = linear(dec!(29), dec!(-0.2), 50);
        assert_eq!(engine().evaluate(&window(&prices)), Signal::Hold);
    }

    #[test]
    fn indicators_follow_recursive_ema_and_plain_sma() {
        let engine = SignalEngine::new(SignalSettings {
            momentum_period: 3,
            fast_period: 2,
            slow_period: 3,
            oversold: 30.0,
            overbought: 70.0,
        })
        .unwrap();

        let snapshot = engine.indicators(&window(&[dec!(1), dec!(2), dec!(3)])).unwrap();

        // EMA(2): 1, 5/3, 23/9. EMA(3): 1, 3/2, 9/4.
        assert!((snapshot.spread - 11.0 / 36.0).abs() < 1e-9);
        assert!((snapshot.momentum - 2.0).abs() < 1e-9);
        assert_eq!(snapshot.last_price, 3.0);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let engine = engine();
        let w = window(&linear(dec!(10), dec!(0.25), 50));
        assert_eq!(engine.evaluate(&w), engine.evaluate(&w));
        assert_eq!(engine.indicators(&w), engine.indicators(&w));
    }

    #[test]
    fn rejects_inconsistent_settings() {
        let inverted = SignalSettings {
            fast_period: 26,
            slow_period: 12,
            ..SignalSettings::default()
        };
        assert!(SignalEngine::new(inverted).is_err());

        let zero = SignalSettings {
            momentum_period: 0,
            ..SignalSettings::default()
        };
        assert!(SignalEngine::new(zero).is_err());

        let levels = SignalSettings {
            oversold: 70.0,
            overbought: 30.0,
            ..SignalSettings::default()
        };
        assert!(SignalEngine::new(levels).is_err());
    }
}
