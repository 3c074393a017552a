use crate::models::PricingError;

/// Crate-wide error type for data fetching and quote construction.
/// Pricing failures are carried through unchanged so callers can tell a
/// domain error from a solver that did not converge.
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("yahoo API error: {status} {body}")]
    YahooApi { status: u16, body: String },

    #[error("ticker symbol not found: {0}")]
    TickerNotFound(String),

    #[error("no options listed for {0}")]
    NoOptions(String),

    #[error("no options listed for {requested}, possible expiration dates: {}", .available.join(", "))]
    ExpirationUnavailable {
        requested: String,
        available: Vec<String>,
    },

    #[error("no option listed for strike {requested}, available strikes: {available:?}")]
    StrikeUnavailable { requested: f64, available: Vec<f64> },

    #[error("a strike price is required, choose one of the listed strikes first")]
    StrikeRequired,

    #[error("config error: {0}")]
    Config(String),

    #[error("pricing error: {0}")]
    Pricing(#[from] PricingError),
}

impl From<reqwest::Error> for QuoteError {
    fn from(e: reqwest::Error) -> Self {
        QuoteError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for QuoteError {
    fn from(e: serde_json::Error) -> Self {
        QuoteError::Parse(e.to_string())
    }
}

impl From<csv::Error> for QuoteError {
    fn from(e: csv::Error) -> Self {
        QuoteError::Parse(e.to_string())
    }
}

impl From<roxmltree::Error> for QuoteError {
    fn from(e: roxmltree::Error) -> Self {
        QuoteError::Parse(e.to_string())
    }
}

pub type QuoteResult<T> = Result<T, QuoteError>;
