pub mod account_response;
pub mod binance_client;
pub mod exchange_info_response;
pub mod kline_response;
pub mod ticker_response;

pub use account_response::{AccountInformation, AccountTrade, Balance, OrderResponse};
pub use binance_client::BinanceClient;
pub use exchange_info_response::{ExchangeInfo, SymbolFilter, SymbolInfo};
pub use kline_response::KlineRow;
pub use ticker_response::{Ticker24h, TickerPrice};
