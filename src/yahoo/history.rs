use super::types::{parse_number, HistoryBar};
use crate::errors::{QuoteError, QuoteResult};
use chrono::NaiveDate;

#[derive(serde::Deserialize)]
struct RawBar {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: String,
    #[serde(rename = "High")]
    high: String,
    #[serde(rename = "Low")]
    low: String,
    #[serde(rename = "Close")]
    close: String,
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<String>,
    #[serde(rename = "Volume")]
    volume: String,
}

/// Parse the history download CSV
/// (`Date,Open,High,Low,Close,Adj Close,Volume`).
///
/// Rows the site pads with `null` (holidays, halted sessions) are skipped.
/// A missing `Adj Close` column falls back to the close.
pub fn parse_history_csv(text: &str) -> QuoteResult<Vec<HistoryBar>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut bars = Vec::new();

    for row in reader.deserialize::<RawBar>() {
        let raw = row?;
        let date = NaiveDate::parse_from_str(raw.date.trim(), "%Y-%m-%d")
            .map_err(|e| QuoteError::Parse(format!("history date {:?}: {e}", raw.date)))?;

        let fields = (
            parse_number(&raw.open),
            parse_number(&raw.high),
            parse_number(&raw.low),
            parse_number(&raw.close),
            parse_number(&raw.volume),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = fields else {
            tracing::debug!(%date, "skipping incomplete history row");
            continue;
        };
        let adj_close = raw.adj_close.as_deref().and_then(parse_number).unwrap_or(close);

        bars.push(HistoryBar {
            date,
            open,
            high,
            low,
            close,
            adj_close,
            volume: volume.max(0.0) as u64,
        });
    }

    Ok(bars)
}
