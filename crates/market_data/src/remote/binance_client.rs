use async_trait::async_trait;
use chrono::Utc;
use common::config::ExchangeSettings;
use common::models::{OrderOutcome, OrderRequest, PricePoint, SymbolConstraints, Ticker};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::remote::{
    AccountInformation, AccountTrade, ExchangeInfo, KlineRow, OrderResponse, Ticker24h, TickerPrice,
};
use crate::traits::{ExchangeGateway, GatewayError, RemoteResponse};

type HmacSha256 = Hmac<Sha256>;

/// Signed Binance spot REST client.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
    quote_asset: String,
    timeout: Duration,
}

impl BinanceClient {
    pub fn new(settings: &ExchangeSettings) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent("binance_advisory_bot/0.1.0")
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            secret_key: settings.secret_key.clone(),
            quote_asset: settings.quote_asset.clone(),
            timeout: settings.timeout,
        })
    }

    fn sign(&self, query: &str) -> Result<String, GatewayError> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| GatewayError::Signing(e.to_string()))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.decode(path, resp).await
    }

    async fn signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let mut query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>();
        query.push(format!("timestamp={}", Utc::now().timestamp_millis()));
        let query = query.join("&");

        let signature = self.sign(&query)?;
        let url = format!("{}{}?{}&signature={}", self.base_url, path, query, signature);

        let resp = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.decode(path, resp).await
    }

    /// A timed out request may still have reached the exchange, so it keeps
    /// its own variant instead of passing as a plain transport error.
    fn transport(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::Transport(e)
        }
    }

    async fn decode<T: DeserializeOwned>(&self, path: &str, resp: Response) -> Result<T, GatewayError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.map_err(|e| self.transport(e))?;
            error!("Binance {} failed with {}: {}", path, status, body);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.transport(e))?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(format!("{path}: {e}")))
    }

    pub async fn exchange_info(&self, symbol: Option<&str>) -> Result<ExchangeInfo, GatewayError> {
        let query: Vec<(&str, String)> = symbol
            .map(|s| vec![("symbol", s.to_uppercase())])
            .unwrap_or_default();
        self.public_get("/api/v3/exchangeInfo", &query).await
    }

    pub async fn get_account(&self) -> Result<AccountInformation, GatewayError> {
        self.signed_request(Method::GET, "/api/v3/account", &[]).await
    }

    pub async fn get_my_trades(
        &self,
        symbol: &str,
        limit: u16,
    ) -> Result<Vec<AccountTrade>, GatewayError> {
        let params = [("symbol", symbol.to_uppercase()), ("limit", limit.to_string())];
        self.signed_request(Method::GET, "/api/v3/myTrades", &params).await
    }

    pub async fn post_order(&self, order: &OrderRequest) -> Result<OrderResponse, GatewayError> {
        let params = [
            ("symbol", order.symbol().to_uppercase()),
            ("side", order.side().to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", order.quantity().to_string()),
            ("newClientOrderId", order.client_order_id().to_string()),
        ];

        info!(
            "Placing Order: {} {} {} ({})",
            order.side(),
            order.quantity(),
            order.symbol(),
            order.client_order_id()
        );

        self.signed_request(Method::POST, "/api/v3/order", &params).await
    }
}

#[async_trait]
impl ExchangeGateway for BinanceClient {
    async fn list_trading_symbols(&self) -> Result<Vec<String>, GatewayError> {
        let info = self.exchange_info(None).await?;
        let symbols: Vec<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.is_trading_in(&self.quote_asset))
            .map(|s| s.symbol)
            .collect();

        debug!("{} symbols trading against {}", symbols.len(), self.quote_asset);
        Ok(symbols)
    }

    async fn get_constraints(&self, symbol: &str) -> Result<SymbolConstraints, GatewayError> {
        let info = self.exchange_info(Some(symbol)).await?;
        info.symbols
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| GatewayError::UnknownSymbol(symbol.to_string()))?
            .to_domain()
    }

    async fn get_price(&self, symbol: &str) -> Result<Decimal, GatewayError> {
        let ticker: TickerPrice = self
            .public_get("/api/v3/ticker/price", &[("symbol", symbol.to_uppercase())])
            .await?;
        Ok(ticker.price)
    }

    async fn get_price_history(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<PricePoint>, GatewayError> {
        let query = [
            ("symbol", symbol.to_uppercase()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<KlineRow> = self.public_get("/api/v3/klines", &query).await?;
        rows.iter().map(RemoteResponse::<PricePoint>::to_domain).collect()
    }

    async fn get_market_tickers(&self) -> Result<Vec<Ticker>, GatewayError> {
        let tickers: Vec<Ticker24h> = self.public_get("/api/v3/ticker/24hr", &[]).await?;
        tickers.iter().map(RemoteResponse::<Ticker>::to_domain).collect()
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderOutcome, GatewayError> {
        let resp = self.post_order(order).await?;
        info!(
            "ORDER EXECUTED: ID={}, Status={}, Executed={} ({} quote)",
            resp.order_id, resp.status, resp.executed_qty, resp.cummulative_quote_qty
        );
        Ok(OrderOutcome::accepted(resp.order_id, resp.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::{OrderQuantity, Side};
    use rust_decimal_macros::dec;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> BinanceClient {
        client_with_timeout(server, Duration::from_secs(5))
    }

    fn client_with_timeout(server: &MockServer, timeout: Duration) -> BinanceClient {
        BinanceClient::new(&ExchangeSettings {
            api_key: "api-key".to_string(),
            secret_key: "secret".to_string(),
            base_url: server.uri(),
            quote_asset: "USDT".to_string(),
            max_symbols: 5,
            kline_interval: "1h".to_string(),
            kline_limit: 50,
            timeout,
        })
        .unwrap()
    }

    #[test]
    fn signature_matches_binance_reference_vector() {
        // Example from the Binance SIGNED endpoint documentation.
        let client = BinanceClient {
            client: Client::new(),
            base_url: String::new(),
            api_key: String::new(),
            secret_key: "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j".to_string(),
            quote_asset: "USDT".to_string(),
            timeout: Duration::from_secs(5),
        };
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";

        assert_eq!(
            client.sign(query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[tokio::test]
    async fn lists_only_trading_symbols_in_quote_asset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/exchangeInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"symbols": [
                    {"symbol": "BTCUSDT", "status": "TRADING", "quoteAsset": "USDT", "filters": []},
                    {"symbol": "ETHBTC", "status": "TRADING", "quoteAsset": "BTC", "filters": []},
                    {"symbol": "LUNAUSDT", "status": "BREAK", "quoteAsset": "USDT", "filters": []}
                ]}"#,
            ))
            .mount(&server)
            .await;

        let symbols = client(&server).list_trading_symbols().await.unwrap();
        assert_eq!(symbols, vec!["BTCUSDT".to_string()]);
    }

    #[tokio::test]
    async fn reads_ticker_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/ticker/price"))
            .and(query_param("symbol", "SOLUSDT"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"symbol": "SOLUSDT", "price": "142.17000000"}"#),
            )
            .mount(&server)
            .await;

        let price = client(&server).get_price("solusdt").await.unwrap();
        assert_eq!(price, dec!(142.17));
    }

    #[tokio::test]
    async fn order_is_signed_and_carries_client_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/order"))
            .and(header("X-MBX-APIKEY", "api-key"))
            .and(query_param("symbol", "BTCUSDT"))
            .and(query_param("side", "BUY"))
            .and(query_param("type", "MARKET"))
            .and(query_param("quantity", "0.0002"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"orderId": 28, "symbol": "BTCUSDT", "status": "FILLED",
                    "executedQty": "0.00020000", "cummulativeQuoteQty": "12.50000000"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let constraints = SymbolConstraints::new(dec!(5), dec!(0.00001), dec!(9000), Some(dec!(0.00001)));
        let qty = OrderQuantity::checked(dec!(0.0002), dec!(62500), &constraints).unwrap();
        let order = OrderRequest::new("BTCUSDT", Side::Buy, qty);

        let outcome = client(&server).submit_order(&order).await.unwrap();
        assert_eq!(outcome, OrderOutcome::accepted(28, "FILLED"));

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or_default().to_string();
        assert!(query.contains(&format!("newClientOrderId={}", order.client_order_id())));
        assert!(query.contains("signature="));
    }

    #[tokio::test]
    async fn rejection_keeps_exchange_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/order"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"code": -1013, "msg": "Filter failure: NOTIONAL"}"#),
            )
            .mount(&server)
            .await;

        let constraints = SymbolConstraints::new(dec!(5), dec!(1), dec!(100), None);
        let qty = OrderQuantity::checked(dec!(1), dec!(10), &constraints).unwrap();
        let order = OrderRequest::new("BTCUSDT", Side::Sell, qty);

        match client(&server).submit_order(&order).await {
            Err(GatewayError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("NOTIONAL"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unanswered_order_times_out_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/order"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"orderId": 1, "symbol": "BTCUSDT", "status": "FILLED",
                        "executedQty": "1", "cummulativeQuoteQty": "10"}"#)
                    .set_delay(Duration::from_secs(3)),
            )
            .expect(1..=5)
            .mount(&server)
            .await;

        let constraints = SymbolConstraints::new(dec!(5), dec!(1), dec!(100), None);
        let qty = OrderQuantity::checked(dec!(1), dec!(10), &constraints).unwrap();
        let order = OrderRequest::new("BTCUSDT", Side::Buy, qty);
        let client = client_with_timeout(&server, Duration::from_millis(300));

        for _ in 0..5 {
            let result = crate::traits::with_timeout(Duration::from_millis(300), client.submit_order(&order)).await;
            assert!(matches!(result, Err(GatewayError::Timeout(_))), "{result:?}");
        }
    }
}
