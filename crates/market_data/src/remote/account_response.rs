use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    #[serde(rename = "orderId")]
    pub order_id: u64,
    pub symbol: String,
    pub status: String,
    #[serde(rename = "executedQty")]
    pub executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty")]
    pub cummulative_quote_qty: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountInformation {
    pub balances: Vec<Balance>,
    #[serde(rename = "canTrade")]
    pub can_trade: bool,
}

/// Entry of `/api/v3/myTrades`.
#[derive(Debug, Deserialize)]
pub struct AccountTrade {
    pub symbol: String,
    pub id: u64,
    #[serde(rename = "orderId")]
    pub order_id: u64,
    pub price: Decimal,
    pub qty: Decimal,
    #[serde(rename = "quoteQty")]
    pub quote_qty: Decimal,
    /// Milliseconds since the epoch.
    pub time: i64,
    #[serde(rename = "isBuyer")]
    pub is_buyer: bool,
}

impl AccountTrade {
    pub fn side(&self) -> &'static str {
        if self.is_buyer { "BUY" } else { "SELL" }
    }
}
