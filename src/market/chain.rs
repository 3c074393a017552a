use super::option::OptionQuote;
use super::stock::Stock;
use crate::errors::{QuoteError, QuoteResult};
use crate::models::{OptionKind, RateCurve};
use crate::yahoo::types::{epoch_to_date, OptionChainResult};
use crate::yahoo::{OptionContract, YahooClient};
use chrono::{NaiveDate, Utc};

/// Expiration format used in messages and `Display`, e.g. "16-10-2026".
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Strikes closer than this are the same listing.
const STRIKE_EPSILON: f64 = 1e-9;

/// What to look up: one side of one expiration, optionally one strike.
///
/// Non-strict requests fall back to the closest listed expiration and the
/// closest listed strike; strict requests fail instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRequest {
    pub ticker: String,
    pub kind: OptionKind,
    pub expiration: NaiveDate,
    pub strike: Option<f64>,
    pub strict: bool,
}

impl ChainRequest {
    pub fn new(ticker: &str, kind: OptionKind, expiration: NaiveDate) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            kind,
            expiration,
            strike: None,
            strict: false,
        }
    }

    pub fn with_strike(mut self, strike: f64) -> Self {
        self.strike = Some(strike);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Contracts of one kind at one resolved expiration, plus the underlying
/// snapshot they are priced against.
#[derive(Debug, Clone)]
pub struct OptionChain {
    ticker: String,
    kind: OptionKind,
    expiration: NaiveDate,
    expirations: Vec<NaiveDate>,
    contracts: Vec<OptionContract>,
    underlying: Stock,
}

impl OptionChain {
    /// Resolve the expiration, then build the chain once.
    ///
    /// 1. Fetch the requested expiration.
    /// 2. If it has no contracts of the requested kind, drop it from the
    ///    candidates and (unless strict) fetch the closest remaining one.
    /// 3. Anything still empty is `ExpirationUnavailable`.
    pub async fn fetch(client: &YahooClient, request: &ChainRequest) -> QuoteResult<Self> {
        let ticker = request.ticker.trim().to_uppercase();
        let underlying = Stock::fetch(client, &ticker, None).await?;

        let first = client.option_chain(&ticker, Some(request.expiration)).await?;
        let mut candidates = listed_expirations(&ticker, &first)?;

        if let Some(chain) = Self::assemble(&ticker, request, &first, &candidates, &underlying) {
            return Ok(chain);
        }

        candidates.retain(|d| *d != request.expiration);
        if request.strict {
            return Err(expiration_unavailable(request.expiration, &candidates));
        }

        let closest = closest_expiration(&candidates, request.expiration)
            .ok_or_else(|| expiration_unavailable(request.expiration, &candidates))?;
        tracing::info!(
            ticker = %ticker,
            requested = %request.expiration.format(DATE_FORMAT),
            using = %closest.format(DATE_FORMAT),
            "no options listed for given date, using closest expiration"
        );

        let retry = client.option_chain(&ticker, Some(closest)).await?;
        let retry_request = ChainRequest {
            expiration: closest,
            ..request.clone()
        };
        Self::assemble(&ticker, &retry_request, &retry, &candidates, &underlying).ok_or_else(|| {
            candidates.retain(|d| *d != closest);
            expiration_unavailable(request.expiration, &candidates)
        })
    }

    fn assemble(
        ticker: &str,
        request: &ChainRequest,
        result: &OptionChainResult,
        candidates: &[NaiveDate],
        underlying: &Stock,
    ) -> Option<Self> {
        let set = result.option_set()?;
        let contracts = match request.kind {
            OptionKind::Call => &set.calls,
            OptionKind::Put => &set.puts,
        };
        if contracts.is_empty() {
            return None;
        }

        let expiration = set
            .expiration_date
            .and_then(epoch_to_date)
            .unwrap_or(request.expiration);

        Some(Self {
            ticker: ticker.to_string(),
            kind: request.kind,
            expiration,
            expirations: candidates.to_vec(),
            contracts: contracts.clone(),
            underlying: underlying.clone(),
        })
    }

    #[inline]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    #[inline]
    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    #[inline]
    pub fn expiration(&self) -> NaiveDate {
        self.expiration
    }

    /// Listed expirations with any date known to be empty for this kind removed.
    pub fn expirations(&self) -> &[NaiveDate] {
        &self.expirations
    }

    pub fn underlying(&self) -> &Stock {
        &self.underlying
    }

    pub fn contracts(&self) -> &[OptionContract] {
        &self.contracts
    }

    pub fn strikes(&self) -> Vec<f64> {
        self.contracts.iter().map(|c| c.strike).collect()
    }

    pub fn closest_strike(&self, target: f64) -> Option<f64> {
        closest_strike(&self.strikes(), target)
    }

    /// Quote for an exactly listed strike.
    pub fn quote(&self, strike: f64, curve: &dyn RateCurve) -> QuoteResult<OptionQuote> {
        self.quote_as_of(strike, curve, Utc::now().date_naive())
    }

    /// Quote for `strike`, or (unless strict) for the closest listed strike.
    pub fn resolve_quote(&self, strike: f64, strict: bool, curve: &dyn RateCurve) -> QuoteResult<OptionQuote> {
        self.resolve_quote_as_of(strike, strict, curve, Utc::now().date_naive())
    }

    pub(crate) fn quote_as_of(
        &self,
        strike: f64,
        curve: &dyn RateCurve,
        as_of: NaiveDate,
    ) -> QuoteResult<OptionQuote> {
        let contract = self
            .contracts
            .iter()
            .find(|c| (c.strike - strike).abs() < STRIKE_EPSILON)
            .ok_or_else(|| QuoteError::StrikeUnavailable {
                requested: strike,
                available: self.strikes(),
            })?;

        Ok(OptionQuote::from_contract(
            &self.ticker,
            self.kind,
            self.expiration,
            contract,
            self.underlying.clone(),
            curve,
            as_of,
        ))
    }

    pub(crate) fn resolve_quote_as_of(
        &self,
        strike: f64,
        strict: bool,
        curve: &dyn RateCurve,
        as_of: NaiveDate,
    ) -> QuoteResult<OptionQuote> {
        let listed = self.strikes();
        if strict || listed.iter().any(|s| (s - strike).abs() < STRIKE_EPSILON) {
            return self.quote_as_of(strike, curve, as_of);
        }

        let closest = closest_strike(&listed, strike).ok_or_else(|| QuoteError::StrikeUnavailable {
            requested: strike,
            available: Vec::new(),
        })?;
        tracing::info!(
            ticker = %self.ticker,
            requested = strike,
            using = closest,
            "no option for given strike, using closest strike"
        );
        self.quote_as_of(closest, curve, as_of)
    }
}

fn listed_expirations(ticker: &str, result: &OptionChainResult) -> QuoteResult<Vec<NaiveDate>> {
    if result.options.is_empty() {
        return Err(QuoteError::NoOptions(ticker.to_string()));
    }
    Ok(result.expiration_dates())
}

fn expiration_unavailable(requested: NaiveDate, available: &[NaiveDate]) -> QuoteError {
    QuoteError::ExpirationUnavailable {
        requested: requested.format(DATE_FORMAT).to_string(),
        available: available
            .iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect(),
    }
}

/// Nearest date by absolute day distance; ties go to the earlier listing.
pub fn closest_expiration(available: &[NaiveDate], requested: NaiveDate) -> Option<NaiveDate> {
    available
        .iter()
        .copied()
        .min_by_key(|d| (*d - requested).num_days().abs())
}

/// Nearest strike by absolute distance; ties go to the earlier listing.
pub fn closest_strike(strikes: &[f64], target: f64) -> Option<f64> {
    strikes
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .min_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs()))
}
