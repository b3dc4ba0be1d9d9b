use rust_decimal::Decimal;
use thiserror::Error;

/// Why no compliant quantity could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    #[error("cannot size against non-positive price {0}")]
    NonPositivePrice(Decimal),

    #[error("sized quantity is zero")]
    ZeroQuantity,

    #[error("quantity {quantity} below minimum quantity {min_qty}")]
    BelowMinQty { quantity: Decimal, min_qty: Decimal },

    #[error("quantity {quantity} above maximum quantity {max_qty}")]
    AboveMaxQty { quantity: Decimal, max_qty: Decimal },

    #[error("quantity {quantity} is not a multiple of step {step}")]
    OffStep { quantity: Decimal, step: Decimal },

    #[error("quantity {quantity} is worth {notional}, below minimum notional {min_notional}")]
    BelowMinNotional {
        quantity: Decimal,
        notional: Decimal,
        min_notional: Decimal,
    },

    #[error("decimal overflow while sizing")]
    Overflow,
}

/// Terminal failures of one symbol's trading cycle. None of them stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("{symbol}: data unavailable: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("{symbol}: sizing violation: {source}")]
    SizingViolation {
        symbol: String,
        #[source]
        source: SizingError,
    },
}

impl CycleError {
    pub fn data_unavailable(symbol: &str, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::DataUnavailable { symbol, .. } | Self::SizingViolation { symbol, .. } => symbol,
        }
    }
}
