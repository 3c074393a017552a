use super::chain::{ChainRequest, OptionChain, DATE_FORMAT};
use super::stock::Stock;
use crate::errors::{QuoteError, QuoteResult};
use crate::models::{Greeks, OptionKind, PricingError, PricingInput, PricingResult, RateCurve, Valuation};
use crate::yahoo::{OptionContract, YahooClient};
use chrono::NaiveDate;

/// One listed contract with its market fields and the valuation derived from
/// them. Immutable; `refresh` returns a new quote.
///
/// Market fields are always populated. The valuation may have failed (expired
/// contract, premium outside no-arbitrage bounds, solver did not converge);
/// in that case every analytic accessor returns that same error.
#[derive(Debug, Clone)]
pub struct OptionQuote {
    pub ticker: String,
    pub kind: OptionKind,
    pub expiration: NaiveDate,
    pub strike: f64,
    /// Last traded price, used as the premium.
    pub price: f64,
    pub bid: f64,
    pub ask: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub open_interest: u64,
    pub contract_symbol: String,
    pub in_the_money: bool,
    pub underlying: Stock,
    pub ttl_years: f64,
    pub dividend_yield: f64,
    pub rate: f64,
    valuation: Result<Valuation, PricingError>,
}

impl OptionQuote {
    pub(crate) fn from_contract(
        ticker: &str,
        kind: OptionKind,
        expiration: NaiveDate,
        contract: &OptionContract,
        underlying: Stock,
        curve: &dyn RateCurve,
        as_of: NaiveDate,
    ) -> Self {
        let days = (expiration - as_of).num_days();
        let ttl_years = days as f64 / 365.0;
        let rate = curve.rate(ttl_years.max(0.0));
        let price = contract.last_price.unwrap_or(0.0);
        let dividend_yield = underlying.dividend_yield;

        let valuation = PricingInput::new(
            underlying.price,
            contract.strike,
            ttl_years,
            price,
            rate,
            dividend_yield,
            kind,
        )
        .and_then(Valuation::new);

        if let Err(e) = &valuation {
            tracing::debug!(
                ticker,
                strike = contract.strike,
                expiration = %expiration.format(DATE_FORMAT),
                error = %e,
                "option valuation unavailable"
            );
        }

        Self {
            ticker: ticker.to_string(),
            kind,
            expiration,
            strike: contract.strike,
            price,
            bid: contract.bid.unwrap_or(0.0),
            ask: contract.ask.unwrap_or(0.0),
            change: contract.change.unwrap_or(0.0),
            change_percent: contract.percent_change.unwrap_or(0.0),
            volume: contract.volume.unwrap_or(0.0).max(0.0) as u64,
            open_interest: contract.open_interest.unwrap_or(0.0).max(0.0) as u64,
            contract_symbol: contract.contract_symbol.clone().unwrap_or_default(),
            in_the_money: kind.in_the_money(underlying.price, contract.strike),
            underlying,
            ttl_years,
            dividend_yield,
            rate,
            valuation,
        }
    }

    pub fn valuation(&self) -> PricingResult<&Valuation> {
        self.valuation.as_ref().map_err(Clone::clone)
    }

    pub fn implied_volatility(&self) -> PricingResult<f64> {
        Ok(self.valuation()?.implied_volatility())
    }

    pub fn delta(&self) -> PricingResult<f64> {
        self.valuation()?.delta()
    }

    pub fn gamma(&self) -> PricingResult<f64> {
        self.valuation()?.gamma()
    }

    pub fn vega(&self) -> PricingResult<f64> {
        self.valuation()?.vega()
    }

    pub fn theta(&self) -> PricingResult<f64> {
        self.valuation()?.theta()
    }

    pub fn rho(&self) -> PricingResult<f64> {
        self.valuation()?.rho()
    }

    pub fn greeks(&self) -> PricingResult<Greeks> {
        self.valuation()?.greeks()
    }

    /// Re-fetch the same contract. The strike and expiration must still be
    /// listed; no fallback is applied.
    pub async fn refresh(&self, client: &YahooClient, curve: &dyn RateCurve) -> QuoteResult<Self> {
        let request = ChainRequest::new(&self.ticker, self.kind, self.expiration)
            .with_strike(self.strike)
            .strict(true);
        fetch_option(client, curve, &request).await
    }
}

impl std::fmt::Display for OptionQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(ticker={}, expiration={}, strike={})",
            self.kind,
            self.ticker,
            self.expiration.format(DATE_FORMAT),
            self.strike
        )
    }
}

/// Fetch the chain for `request` and price the requested strike.
pub async fn fetch_option(
    client: &YahooClient,
    curve: &dyn RateCurve,
    request: &ChainRequest,
) -> QuoteResult<OptionQuote> {
    let strike = request.strike.ok_or(QuoteError::StrikeRequired)?;
    let chain = OptionChain::fetch(client, request).await?;
    chain.resolve_quote(strike, request.strict, curve)
}
