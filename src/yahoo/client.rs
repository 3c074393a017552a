use super::history::parse_history_csv;
use super::types::*;
use crate::config::AppConfig;
use crate::errors::{QuoteError, QuoteResult};
use chrono::{NaiveDate, Utc};
use reqwest::{Client, Response};
use smallvec::SmallVec;
use std::sync::Arc;
use tokio::sync::OnceCell;

type QueryParams = SmallVec<[(&'static str, String); 6]>;

/// Yahoo Finance REST client. One `reqwest::Client` with a cookie store; the
/// crumb that goes with the session cookie is fetched once and shared by
/// clones. All methods return Result, never panic.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
    cookie_url: String,
    crumb: Arc<OnceCell<Option<String>>>,
}

impl YahooClient {
    pub fn new(base_url: &str, cookie_url: &str, timeout_secs: u64, user_agent: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .user_agent(user_agent)
                .cookie_store(true)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url: cookie_url.to_string(),
            crumb: Arc::new(OnceCell::new()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.yahoo_base_url,
            &config.yahoo_cookie_url,
            config.http_timeout_secs,
            &config.user_agent,
        )
    }

    /// Session crumb, fetched on first use. A failed handshake is logged and
    /// requests go out without one.
    async fn crumb(&self) -> Option<&str> {
        self.crumb
            .get_or_init(|| async {
                match self.fetch_crumb().await {
                    Ok(crumb) => Some(crumb),
                    Err(e) => {
                        tracing::warn!(error = %e, "crumb handshake failed, continuing without crumb");
                        None
                    }
                }
            })
            .await
            .as_deref()
    }

    async fn fetch_crumb(&self) -> QuoteResult<String> {
        // Only the Set-Cookie matters here; the page itself is usually a 404.
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            tracing::debug!(error = %e, "cookie request failed");
        }

        let resp = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await?;
        let resp = check_status(resp, "getcrumb").await?;
        let crumb = resp.text().await?.trim().to_string();

        if crumb.is_empty() || crumb.contains('<') {
            return Err(QuoteError::Parse(format!("unexpected crumb body: {crumb:?}")));
        }
        Ok(crumb)
    }

    async fn public_get(&self, path: &str, mut params: QueryParams) -> QuoteResult<Response> {
        if let Some(crumb) = self.crumb().await {
            params.push(("crumb", crumb.to_string()));
        }
        let url = format!("{}{}", self.base_url, path);
        Ok(self.client.get(&url).query(params.as_slice()).send().await?)
    }

    /// Quote and option chain for `symbol`. Without an expiration the site
    /// returns its nearest listed one.
    pub async fn option_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> QuoteResult<OptionChainResult> {
        let mut params = QueryParams::new();
        if let Some(date) = expiration {
            params.push(("date", date_to_epoch(date).to_string()));
        }

        let path = format!("/v7/finance/options/{symbol}");
        let resp = self.public_get(&path, params).await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(QuoteError::TickerNotFound(symbol.to_string()));
        }
        let resp = check_status(resp, &path).await?;

        let body: OptionChainResponse = resp
            .json()
            .await
            .map_err(|e| QuoteError::Parse(format!("GET {path}: {e}")))?;

        body.option_chain
            .result
            .into_iter()
            .next()
            .ok_or_else(|| QuoteError::TickerNotFound(symbol.to_string()))
    }

    /// Price history for the last `days_back` days at the given sampling.
    pub async fn history(
        &self,
        symbol: &str,
        days_back: i64,
        frequency: Frequency,
    ) -> QuoteResult<Vec<HistoryBar>> {
        let now = Utc::now();
        let from = now - chrono::Duration::days(days_back);

        let mut params = QueryParams::new();
        params.push(("period1", from.timestamp().to_string()));
        params.push(("period2", now.timestamp().to_string()));
        params.push(("interval", frequency.interval().to_string()));
        params.push(("events", "history".to_string()));
        params.push(("includeAdjustedClose", "true".to_string()));

        let path = format!("/v7/finance/download/{symbol}");
        let resp = self.public_get(&path, params).await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(QuoteError::TickerNotFound(symbol.to_string()));
        }
        let resp = check_status(resp, &path).await?;
        let text = resp.text().await?;

        let bars = parse_history_csv(&text)?;
        tracing::debug!(symbol, rows = bars.len(), "history downloaded");
        Ok(bars)
    }
}

async fn check_status(resp: Response, what: &str) -> QuoteResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(request = what, status = status.as_u16(), "yahoo request rejected");
    Err(QuoteError::YahooApi {
        status: status.as_u16(),
        body,
    })
}
