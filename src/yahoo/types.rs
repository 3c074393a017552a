use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

// ── Option chain (GET /v7/finance/options/{symbol}) ──

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainResponse {
    pub option_chain: OptionChainEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionChainEnvelope {
    #[serde(default)]
    pub result: Vec<OptionChainResult>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainResult {
    pub underlying_symbol: Option<String>,
    #[serde(default)]
    pub expiration_dates: Vec<i64>,
    #[serde(default)]
    pub strikes: Vec<f64>,
    pub quote: QuoteData,
    #[serde(default)]
    pub options: Vec<OptionSet>,
}

impl OptionChainResult {
    /// Listed expirations as calendar dates (UTC), in listing order.
    pub fn expiration_dates(&self) -> Vec<NaiveDate> {
        self.expiration_dates
            .iter()
            .filter_map(|&ts| epoch_to_date(ts))
            .collect()
    }

    #[inline]
    pub fn option_set(&self) -> Option<&OptionSet> {
        self.options.first()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub regular_market_price: Option<f64>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub regular_market_change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub regular_market_change_percent: Option<f64>,
    pub regular_market_time: Option<i64>,
    pub long_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub trailing_annual_dividend_yield: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSet {
    pub expiration_date: Option<i64>,
    #[serde(default)]
    pub calls: Vec<OptionContract>,
    #[serde(default)]
    pub puts: Vec<OptionContract>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    pub contract_symbol: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub strike: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub last_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub bid: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub ask: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub percent_change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub open_interest: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub implied_volatility: Option<f64>,
    pub in_the_money: Option<bool>,
    pub expiration: Option<i64>,
}

// ── Price history (GET /v7/finance/download/{symbol}) ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Value of the `interval` query parameter.
    #[inline]
    pub fn interval(self) -> &'static str {
        match self {
            Self::Daily => "1d",
            Self::Weekly => "1wk",
            Self::Monthly => "1mo",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "d" => Ok(Self::Daily),
            "w" => Ok(Self::Weekly),
            "m" => Ok(Self::Monthly),
            other => Err(format!("unknown frequency: {other} (expected d, w or m)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

// ── Lenient number parsing ──

/// Parse a quoted number the way the site renders them: thousands separators
/// are dropped and a lone "-" means zero.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed == "-" {
        return Some(0.0);
    }
    trimmed.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<NumberOrText> = Option::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => parse_number(&s),
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_opt_f64(deserializer)?.ok_or_else(|| serde::de::Error::custom("expected a number"))
}

#[inline]
pub fn epoch_to_date(ts: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

#[inline]
pub fn date_to_epoch(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}
