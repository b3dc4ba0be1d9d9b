use common::models::Ticker;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::traits::{GatewayError, RemoteResponse};

#[derive(Deserialize, Debug)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}

#[derive(Deserialize, Debug)]
pub struct Ticker24h {
    pub symbol: String,
    #[serde(rename(deserialize = "lastPrice"))]
    pub last_price: Decimal,
    pub volume: Decimal,
}

impl RemoteResponse<Ticker> for Ticker24h {
    fn to_domain(&self) -> Result<Ticker, GatewayError> {
        Ok(Ticker {
            symbol: self.symbol.clone(),
            price: self.last_price,
            volume: self.volume,
        })
    }
}
