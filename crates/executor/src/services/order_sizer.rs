use common::errors::SizingError;
use common::models::{OrderQuantity, SymbolConstraints};
use rust_decimal::Decimal;
use tracing::debug;

/// Smallest order the exchange filters accept at a given price.
///
/// 1. `base = max(min_qty, round(min_notional / price, 2))` (half to even)
/// 2. if `base * price < min_notional`: `base = ceil(min_notional / price)`
/// 3. clamp to `max_qty`
/// 4. floor to a multiple of the step, when there is one
///
/// The clamp and the floor may push the result back under `min_qty` or the
/// notional minimum. Such a quantity is rejected, never raised again: the
/// final check goes through [`OrderQuantity::checked`].
pub struct OrderSizer;

impl OrderSizer {
    pub fn size(price: Decimal, constraints: &SymbolConstraints) -> Result<OrderQuantity, SizingError> {
        if price <= Decimal::ZERO {
            return Err(SizingError::NonPositivePrice(price));
        }

        let exact = constraints
            .min_notional
            .checked_div(price)
            .ok_or(SizingError::Overflow)?;

        let mut base = constraints.min_qty.max(exact.round_dp(2));
        let notional = base.checked_mul(price).ok_or(SizingError::Overflow)?;
        if notional < constraints.min_notional {
            base = exact.ceil();
        }

        if base > constraints.max_qty {
            base = constraints.max_qty;
        }

        if let Some(step) = constraints.step() {
            base = base
                .checked_div(step)
                .and_then(|units| units.floor().checked_mul(step))
                .ok_or(SizingError::Overflow)?;
        }

        debug!(
            "sized {} at price {} (min_notional={}, min_qty={}, max_qty={}, step={:?})",
            base, price, constraints.min_notional, constraints.min_qty, constraints.max_qty, constraints.step_size
        );

        OrderQuantity::checked(base, price, constraints)
    }
}
