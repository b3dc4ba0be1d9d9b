use std::collections::HashMap;
use std::time::Duration;

use common::errors::CycleError;
use common::models::SymbolConstraints;
use tracing::{debug, info, warn};

use crate::traits::{ExchangeGateway, GatewayError, with_timeout};

/// Tradeable symbols of this run and their order filters.
///
/// Built once per run and shared read-only between symbol cycles. A symbol
/// whose filters could not be fetched stays listed with the reason, so its
/// cycle aborts with `DataUnavailable` instead of disappearing silently.
#[derive(Debug, Clone, Default)]
pub struct SymbolCatalog {
    symbols: Vec<String>,
    constraints: HashMap<String, SymbolConstraints>,
    unavailable: HashMap<String, String>,
}

impl SymbolCatalog {
    pub async fn load(
        gateway: &dyn ExchangeGateway,
        max_symbols: usize,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let listed = with_timeout(timeout, gateway.list_trading_symbols()).await?;
        let symbols: Vec<String> = listed
            .into_iter()
            .map(|s| s.to_uppercase())
            .take(max_symbols)
            .collect();

        let mut catalog = Self {
            symbols: Vec::with_capacity(symbols.len()),
            ..Self::default()
        };

        for symbol in symbols {
            match with_timeout(timeout, gateway.get_constraints(&symbol)).await {
                Ok(constraints) => {
                    debug!("{} constraints: {:?}", symbol, constraints);
                    catalog.constraints.insert(symbol.clone(), constraints);
                }
                Err(e) => {
                    warn!("No constraints for {}: {}", symbol, e);
                    catalog.unavailable.insert(symbol.clone(), e.to_string());
                }
            }
            catalog.symbols.push(symbol);
        }

        info!(
            "Symbol catalog ready: {} symbols, {} without constraints",
            catalog.symbols.len(),
            catalog.unavailable.len()
        );
        Ok(catalog)
    }

    /// Builds a catalog from known entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, SymbolConstraints)>) -> Self {
        let mut catalog = Self::default();
        for (symbol, constraints) in entries {
            catalog.symbols.push(symbol.clone());
            catalog.constraints.insert(symbol, constraints);
        }
        catalog
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn constraints(&self, symbol: &str) -> Result<&SymbolConstraints, CycleError> {
        if let Some(constraints) = self.constraints.get(symbol) {
            return Ok(constraints);
        }
        let reason = self
            .unavailable
            .get(symbol)
            .map(|e| format!("constraints unavailable: {e}"))
            .unwrap_or_else(|| "symbol not in catalog".to_string());
        Err(CycleError::data_unavailable(symbol, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockExchangeGateway;
    use rust_decimal_macros::dec;

    fn btc_constraints() -> SymbolConstraints {
        SymbolConstraints::new(dec!(5), dec!(0.00001), dec!(9000), Some(dec!(0.00001)))
    }

    #[tokio::test]
    async fn keeps_symbols_with_failed_constraints_as_unavailable() {
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_list_trading_symbols().returning(|| {
            Ok(vec!["btcusdt".to_string(), "ETHUSDT".to_string(), "SOLUSDT".to_string()])
        });
        gateway.expect_get_constraints().returning(|symbol| match symbol {
            "BTCUSDT" => Ok(btc_constraints()),
            other => Err(GatewayError::UnknownSymbol(other.to_string())),
        });

        let catalog = SymbolCatalog::load(&gateway, 2, Duration::from_secs(1)).await.unwrap();

        assert_eq!(catalog.symbols(), ["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
        assert_eq!(catalog.constraints("BTCUSDT").unwrap(), &btc_constraints());
        match catalog.constraints("ETHUSDT") {
            Err(CycleError::DataUnavailable { symbol, reason }) => {
                assert_eq!(symbol, "ETHUSDT");
                assert!(reason.contains("unknown symbol"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            catalog.constraints("SOLUSDT"),
            Err(CycleError::DataUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn listing_failure_is_propagated() {
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_list_trading_symbols().returning(|| {
            Err(GatewayError::Status {
                status: 503,
                body: "maintenance".to_string(),
            })
        });

        let result = SymbolCatalog::load(&gateway, 5, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(GatewayError::Status { status: 503, .. })));
    }
}
