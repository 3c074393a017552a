use crate::errors::{QuoteError, QuoteResult};
use crate::yahoo::types::QuoteData;
use crate::yahoo::{Frequency, HistoryBar, YahooClient};
use chrono::{DateTime, Utc};

/// `last_trade_display` format, e.g. "16 Oct 2026 20:00:00".
pub const DATETIME_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// Snapshot of an underlying's quote. Immutable; `refresh` returns a new one.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Stock {
    pub ticker: String,
    pub price: f64,
    pub currency: String,
    pub exchange: String,
    pub change: f64,
    pub change_percent: f64,
    pub last_trade: Option<DateTime<Utc>>,
    pub name: String,
    /// Trailing annual dividend yield, 0 when not published.
    pub dividend_yield: f64,
    #[serde(skip)]
    requested: String,
    #[serde(skip)]
    requested_exchange: Option<String>,
}

impl Stock {
    pub async fn fetch(client: &YahooClient, quote: &str, exchange: Option<&str>) -> QuoteResult<Self> {
        let quote = quote.trim().to_uppercase();
        let symbol = match exchange {
            Some(ex) => format!("{quote}.{}", ex.to_uppercase()),
            None => quote.clone(),
        };

        let result = client.option_chain(&symbol, None).await?;
        let stock = Self::from_quote(result.quote, &quote, exchange)?;
        tracing::debug!(ticker = %stock.ticker, price = stock.price, "stock quote fetched");
        Ok(stock)
    }

    pub(crate) fn from_quote(q: QuoteData, requested: &str, exchange: Option<&str>) -> QuoteResult<Self> {
        let price = q
            .regular_market_price
            .filter(|p| p.is_finite())
            .ok_or_else(|| QuoteError::Parse(format!("no market price for {}", q.symbol)))?;

        Ok(Self {
            price,
            currency: q.currency.unwrap_or_default(),
            exchange: q.exchange.unwrap_or_default(),
            change: q.regular_market_change.unwrap_or(0.0),
            change_percent: q.regular_market_change_percent.unwrap_or(0.0),
            last_trade: q.regular_market_time.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            name: q.long_name.unwrap_or_default(),
            dividend_yield: q.trailing_annual_dividend_yield.unwrap_or(0.0).max(0.0),
            ticker: q.symbol,
            requested: requested.to_string(),
            requested_exchange: exchange.map(str::to_string),
        })
    }

    /// Fetch a fresh snapshot for the same ticker and exchange.
    pub async fn refresh(&self, client: &YahooClient) -> QuoteResult<Self> {
        Self::fetch(client, &self.requested, self.requested_exchange.as_deref()).await
    }

    pub fn last_trade_display(&self) -> Option<String> {
        self.last_trade.map(|t| t.format(DATETIME_FORMAT).to_string())
    }

    pub async fn history(
        &self,
        client: &YahooClient,
        days_back: i64,
        frequency: Frequency,
    ) -> QuoteResult<Vec<HistoryBar>> {
        client.history(&self.ticker, days_back, frequency).await
    }
}

impl std::fmt::Display for Stock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stock(ticker={}, price={})", self.ticker, self.price)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn quote(symbol: &str, price: f64) -> QuoteData {
        QuoteData {
            symbol: symbol.to_string(),
            regular_market_price: Some(price),
            currency: Some("USD".into()),
            exchange: Some("NMS".into()),
            regular_market_change: Some(1.25),
            regular_market_change_percent: Some(0.8),
            regular_market_time: Some(1_792_123_200),
            long_name: Some("Example Corp".into()),
            trailing_annual_dividend_yield: Some(0.012),
        }
    }

    #[test]
    fn test_from_quote() {
        let stock = Stock::from_quote(quote("XMPL", 155.5), "XMPL", None).unwrap();
        assert_eq!(stock.ticker, "XMPL");
        assert_eq!(stock.dividend_yield, 0.012);
        assert_eq!(stock.to_string(), "Stock(ticker=XMPL, price=155.5)");
        assert_eq!(stock.last_trade_display().as_deref(), Some("16 Oct 2026 04:00:00"));
    }

    #[test]
    fn test_missing_fields_default() {
        let mut q = quote("XMPL", 10.0);
        q.long_name = None;
        q.trailing_annual_dividend_yield = None;
        q.regular_market_time = None;
        let stock = Stock::from_quote(q, "XMPL", None).unwrap();
        assert_eq!(stock.name, "");
        assert_eq!(stock.dividend_yield, 0.0);
        assert!(stock.last_trade_display().is_none());
    }

    #[test]
    fn test_missing_price_is_error() {
        let mut q = quote("XMPL", 10.0);
        q.regular_market_price = None;
        assert!(matches!(Stock::from_quote(q, "XMPL", None), Err(QuoteError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_with_exchange_suffix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/options/SHOP.TO"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "optionChain": {"result": [{
                    "quote": {"symbol": "SHOP.TO", "regularMarketPrice": 88.0, "currency": "CAD"}
                }]}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = YahooClient::new(&server.uri(), &server.uri(), 5, "test");
        let stock = Stock::fetch(&client, "shop", Some("to")).await.unwrap();
        assert_eq!(stock.ticker, "SHOP.TO");
        assert_eq!(stock.currency, "CAD");

        let again = stock.refresh(&client).await.unwrap();
        assert_eq!(again, stock);
    }
}
