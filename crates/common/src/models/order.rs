use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::SizingError;
use crate::models::SymbolConstraints;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order quantity that satisfied every filter of its symbol at the price
/// it was sized against. The only way to get one is [`OrderQuantity::checked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OrderQuantity(Decimal);

impl OrderQuantity {
    pub fn checked(
        quantity: Decimal,
        price: Decimal,
        constraints: &SymbolConstraints,
    ) -> Result<Self, SizingError> {
        if price <= Decimal::ZERO {
            return Err(SizingError::NonPositivePrice(price));
        }
        if quantity <= Decimal::ZERO {
            return Err(SizingError::ZeroQuantity);
        }
        if quantity < constraints.min_qty {
            return Err(SizingError::BelowMinQty {
                quantity,
                min_qty: constraints.min_qty,
            });
        }
        if quantity > constraints.max_qty {
            return Err(SizingError::AboveMaxQty {
                quantity,
                max_qty: constraints.max_qty,
            });
        }
        if let Some(step) = constraints.step() {
            let remainder = quantity.checked_rem(step).ok_or(SizingError::Overflow)?;
            if !remainder.is_zero() {
                return Err(SizingError::OffStep { quantity, step });
            }
        }
        let notional = quantity.checked_mul(price).ok_or(SizingError::Overflow)?;
        if notional < constraints.min_notional {
            return Err(SizingError::BelowMinNotional {
                quantity,
                notional,
                min_notional: constraints.min_notional,
            });
        }

        Ok(Self(quantity))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for OrderQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// A market order ready for submission. Built once per cycle, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    symbol: String,
    side: Side,
    quantity: OrderQuantity,
    client_order_id: String,
}

impl OrderRequest {
    pub fn new(symbol: impl Into<String>, side: Side, quantity: OrderQuantity) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            client_order_id: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn quantity(&self) -> OrderQuantity {
        self.quantity
    }

    /// Sent as `newClientOrderId` so the exchange rejects accidental duplicates.
    pub fn client_order_id(&self) -> &str {
        &self.client_order_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub accepted: bool,
    pub exchange_order_id: Option<u64>,
    pub status: Option<String>,
    pub error_detail: Option<String>,
}

impl OrderOutcome {
    pub fn accepted(exchange_order_id: u64, status: impl Into<String>) -> Self {
        Self {
            accepted: true,
            exchange_order_id: Some(exchange_order_id),
            status: Some(status.into()),
            error_detail: None,
        }
    }

    pub fn rejected(error_detail: impl Into<String>) -> Self {
        Self {
            accepted: false,
            exchange_order_id: None,
            status: None,
            error_detail: Some(error_detail.into()),
        }
    }

    /// Accepted and at least partly executed. An accepted MARKET order can
    /// still end `EXPIRED` or sit as `NEW` without any fill.
    pub fn is_filled(&self) -> bool {
        self.accepted && matches!(self.status.as_deref(), Some("FILLED" | "PARTIALLY_FILLED"))
    }
}

/// Audit entry for one submitted order. Written once, never updated.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    pub recorded_at: DateTime<Utc>,
    pub symbol: String,
    pub side: Side,
    pub quantity: OrderQuantity,
    pub client_order_id: String,
    pub outcome: OrderOutcome,
}

impl OrderRecord {
    pub fn new(request: &OrderRequest, outcome: OrderOutcome) -> Self {
        Self {
            recorded_at: Utc::now(),
            symbol: request.symbol().to_string(),
            side: request.side(),
            quantity: request.quantity(),
            client_order_id: request.client_order_id().to_string(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn constraints() -> SymbolConstraints {
        SymbolConstraints::new(dec!(10), dec!(1), dec!(100), Some(dec!(0.1)))
    }

    #[test]
    fn accepts_compliant_quantity() {
        let qty = OrderQuantity::checked(dec!(2.0), dec!(5), &constraints()).unwrap();
        assert_eq!(qty.value(), dec!(2));
        assert_eq!(qty.to_string(), "2");
    }

    #[test]
    fn rejects_each_violated_filter() {
        let c = constraints();
        assert!(matches!(
            OrderQuantity::checked(dec!(2), dec!(0), &c),
            Err(SizingError::NonPositivePrice(_))
        ));
        assert!(matches!(
            OrderQuantity::checked(dec!(0.5), dec!(50), &c),
            Err(SizingError::BelowMinQty { .. })
        ));
        assert!(matches!(
            OrderQuantity::checked(dec!(101), dec!(5), &c),
            Err(SizingError::AboveMaxQty { .. })
        ));
        assert!(matches!(
            OrderQuantity::checked(dec!(2.05), dec!(5), &c),
            Err(SizingError::OffStep { .. })
        ));
        assert!(matches!(
            OrderQuantity::checked(dec!(1.5), dec!(5), &c),
            Err(SizingError::BelowMinNotional { .. })
        ));
    }

    #[test]
    fn requests_get_distinct_client_ids() {
        let qty = OrderQuantity::checked(dec!(2), dec!(5), &constraints()).unwrap();
        let a = OrderRequest::new("BTCUSDT", Side::Buy, qty);
        let b = OrderRequest::new("BTCUSDT", Side::Buy, qty);
        assert_ne!(a.client_order_id(), b.client_order_id());
        assert_eq!(a.client_order_id().len(), 32);
    }

    #[test]
    fn only_executed_statuses_count_as_filled() {
        assert!(OrderOutcome::accepted(1, "FILLED").is_filled());
        assert!(OrderOutcome::accepted(2, "PARTIALLY_FILLED").is_filled());
        assert!(!OrderOutcome::accepted(3, "NEW").is_filled());
        assert!(!OrderOutcome::accepted(4, "EXPIRED").is_filled());
        assert!(!OrderOutcome::accepted(5, "EXPIRED_IN_MATCH").is_filled());
        assert!(!OrderOutcome::rejected("insufficient balance").is_filled());
    }

    #[test]
    fn notional_overflow_is_an_error() {
        let c = SymbolConstraints::new(dec!(1), dec!(1), Decimal::MAX, None);

        assert_eq!(OrderQuantity::checked(Decimal::MAX, dec!(2), &c), Err(SizingError::Overflow));
    }
}
