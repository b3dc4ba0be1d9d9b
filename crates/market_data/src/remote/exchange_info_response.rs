use common::models::SymbolConstraints;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::traits::{GatewayError, RemoteResponse};

#[derive(Deserialize, Debug)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Deserialize, Debug)]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    #[serde(rename(deserialize = "quoteAsset"))]
    pub quote_asset: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    #[serde(rename = "LOT_SIZE")]
    LotSize {
        #[serde(rename = "minQty")]
        min_qty: Decimal,
        #[serde(rename = "maxQty")]
        max_qty: Decimal,
        #[serde(rename = "stepSize")]
        step_size: Decimal,
    },
    /// Extra quantity bounds for MARKET orders. Zero fields mean "no bound".
    #[serde(rename = "MARKET_LOT_SIZE")]
    MarketLotSize {
        #[serde(rename = "minQty")]
        min_qty: Decimal,
        #[serde(rename = "maxQty")]
        max_qty: Decimal,
        #[serde(rename = "stepSize")]
        step_size: Decimal,
    },
    #[serde(rename = "NOTIONAL")]
    Notional {
        #[serde(rename = "minNotional")]
        min_notional: Decimal,
    },
    /// Older symbols still publish the legacy filter name.
    #[serde(rename = "MIN_NOTIONAL")]
    MinNotional {
        #[serde(rename = "minNotional")]
        min_notional: Decimal,
    },
    #[serde(other)]
    Other,
}

impl SymbolInfo {
    pub fn is_trading_in(&self, quote_asset: &str) -> bool {
        self.status == "TRADING" && self.quote_asset.eq_ignore_ascii_case(quote_asset)
    }
}

impl RemoteResponse<SymbolConstraints> for SymbolInfo {
    fn to_domain(&self) -> Result<SymbolConstraints, GatewayError> {
        let mut lot = None;
        let mut market_lot = None;
        let mut min_notional = None;

        for filter in &self.filters {
            match filter {
                SymbolFilter::LotSize {
                    min_qty,
                    max_qty,
                    step_size,
                } => lot = Some((*min_qty, *max_qty, *step_size)),
                SymbolFilter::MarketLotSize {
                    min_qty,
                    max_qty,
                    step_size,
                } => market_lot = Some((*min_qty, *max_qty, *step_size)),
                SymbolFilter::Notional { min_notional: value }
                | SymbolFilter::MinNotional { min_notional: value } => {
                    // NOTIONAL supersedes MIN_NOTIONAL when both are present.
                    if min_notional.is_none() || matches!(filter, SymbolFilter::Notional { .. }) {
                        min_notional = Some(*value);
                    }
                }
                SymbolFilter::Other => {}
            }
        }

        let (mut min_qty, mut max_qty, mut step_size) = lot.ok_or_else(|| GatewayError::MissingFilter {
            symbol: self.symbol.clone(),
            filter: "LOT_SIZE",
        })?;
        let min_notional = min_notional.ok_or_else(|| GatewayError::MissingFilter {
            symbol: self.symbol.clone(),
            filter: "NOTIONAL",
        })?;

        // Orders are MARKET orders, so both quantity filters apply.
        if let Some((market_min, market_max, market_step)) = market_lot {
            min_qty = min_qty.max(market_min);
            if market_max > Decimal::ZERO {
                max_qty = max_qty.min(market_max);
            }
            if market_step > step_size {
                step_size = market_step;
            }
        }

        Ok(SymbolConstraints::new(min_notional, min_qty, max_qty, Some(step_size)))
    }
}
