pub mod market_snapshot;
pub mod symbol_catalog;

pub use market_snapshot::MarketSnapshot;
pub use symbol_catalog::SymbolCatalog;
