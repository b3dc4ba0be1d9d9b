use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::models::PricePoint;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::traits::{GatewayError, RemoteResponse};

/// One row of `/api/v3/klines`:
/// `[openTime, open, high, low, close, volume, closeTime, ...]`.
#[derive(Deserialize, Debug)]
#[serde(transparent)]
pub struct KlineRow(pub Vec<Value>);

const CLOSE: usize = 4;
const CLOSE_TIME: usize = 6;

impl RemoteResponse<PricePoint> for KlineRow {
    fn to_domain(&self) -> Result<PricePoint, GatewayError> {
        let close = self
            .0
            .get(CLOSE)
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Decode("kline row without close price".to_string()))?;
        let close_time = self
            .0
            .get(CLOSE_TIME)
            .and_then(Value::as_i64)
            .ok_or_else(|| GatewayError::Decode("kline row without close time".to_string()))?;

        let price = Decimal::from_str(close)
            .map_err(|e| GatewayError::Decode(format!("kline close {close:?}: {e}")))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(close_time)
            .ok_or_else(|| GatewayError::Decode(format!("kline close time {close_time} out of range")))?;

        Ok(PricePoint::new(timestamp, price))
    }
}
