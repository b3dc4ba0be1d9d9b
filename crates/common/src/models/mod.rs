pub mod order;
pub mod price;
pub mod signal;
pub mod symbol;

pub use order::{OrderOutcome, OrderQuantity, OrderRecord, OrderRequest, Side};
pub use price::{PricePoint, PriceWindow};
pub use signal::{Signal, UnknownSignal};
pub use symbol::{SymbolConstraints, Ticker};
