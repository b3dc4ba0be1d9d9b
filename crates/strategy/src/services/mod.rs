pub mod signal_engine;

pub use signal_engine::{IndicatorSnapshot, SignalEngine, StrategyError};
