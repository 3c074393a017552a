use crate::errors::{QuoteError, QuoteResult};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub yahoo_base_url: String,
    pub yahoo_cookie_url: String,
    pub treasury_url: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub fallback_risk_free_rate: f64,
    pub overnight_rate: f64,
}

impl AppConfig {
    pub fn from_env() -> QuoteResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> QuoteResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let http_timeout_secs = var_or("HTTP_TIMEOUT_SECS", "5")
            .parse::<u64>()
            .map_err(|e| QuoteError::Config(format!("HTTP_TIMEOUT_SECS: {e}")))?;

        let fallback_risk_free_rate = var_or("FALLBACK_RISK_FREE_RATE", "0.02")
            .parse::<f64>()
            .map_err(|e| QuoteError::Config(format!("FALLBACK_RISK_FREE_RATE: {e}")))?;

        let overnight_rate = var_or("OVERNIGHT_RATE", "0.0")
            .parse::<f64>()
            .map_err(|e| QuoteError::Config(format!("OVERNIGHT_RATE: {e}")))?;

        if !fallback_risk_free_rate.is_finite() || !overnight_rate.is_finite() {
            return Err(QuoteError::Config("rates must be finite".into()));
        }

        Ok(Self {
            yahoo_base_url: var_or("YAHOO_BASE_URL", "https://query2.finance.yahoo.com"),
            yahoo_cookie_url: var_or("YAHOO_COOKIE_URL", "https://fc.yahoo.com"),
            treasury_url: var_or(
                "TREASURY_URL",
                "https://home.treasury.gov/sites/default/files/interest-rates/yield.xml",
            ),
            http_timeout_secs,
            user_agent: var_or("USER_AGENT", "Mozilla/5.0"),
            fallback_risk_free_rate,
            overnight_rate,
        })
    }
}
