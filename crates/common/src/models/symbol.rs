use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-symbol order filters as published by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolConstraints {
    pub min_notional: Decimal,
    pub min_qty: Decimal,
    pub max_qty: Decimal,
    /// `None` when the exchange does not require stepping.
    pub step_size: Option<Decimal>,
}

impl SymbolConstraints {
    pub fn new(
        min_notional: Decimal,
        min_qty: Decimal,
        max_qty: Decimal,
        step_size: Option<Decimal>,
    ) -> Self {
        Self {
            min_notional,
            min_qty,
            max_qty,
            // A zero step is how the exchange says "no stepping".
            step_size: step_size.filter(|step| !step.is_zero()),
        }
    }

    /// Non-zero step, if any.
    pub fn step(&self) -> Option<Decimal> {
        self.step_size.filter(|step| !step.is_zero())
    }
}

/// Last traded price and 24h volume of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub price: Decimal,
    pub volume: Decimal,
}
