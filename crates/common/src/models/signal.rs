use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::order::Side;

/// Trading decision produced by the signal engine, possibly confirmed or
/// replaced by the advisory gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Buy, Signal::Sell, Signal::Hold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }

    /// Order side for actionable signals, `None` for HOLD.
    pub fn side(&self) -> Option<Side> {
        match self {
            Signal::Buy => Some(Side::Buy),
            Signal::Sell => Some(Side::Sell),
            Signal::Hold => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal token: {0:?}")]
pub struct UnknownSignal(pub String);

/// Exact token match only. Callers normalize case and whitespace first.
impl FromStr for Signal {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signal::ALL
            .into_iter()
            .find(|signal| signal.as_str() == s)
            .ok_or_else(|| UnknownSignal(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_exact_tokens() {
        assert_eq!("BUY".parse::<Signal>(), Ok(Signal::Buy));
        assert_eq!("SELL".parse::<Signal>(), Ok(Signal::Sell));
        assert_eq!("HOLD".parse::<Signal>(), Ok(Signal::Hold));

        assert!("buy".parse::<Signal>().is_err());
        assert!("BUY.".parse::<Signal>().is_err());
        assert!(" BUY".parse::<Signal>().is_err());
        assert!("".parse::<Signal>().is_err());
    }

    #[test]
    fn hold_has_no_side() {
        assert_eq!(Signal::Buy.side(), Some(Side::Buy));
        assert_eq!(Signal::Sell.side(), Some(Side::Sell));
        assert_eq!(Signal::Hold.side(), None);
    }

    #[test]
    fn serializes_as_exchange_tokens() {
        assert_eq!(serde_json::to_string(&Signal::Sell).unwrap(), "\"SELL\"");
    }
}
