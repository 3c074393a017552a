use crate::models::{finite, non_negative, positive, OptionKind, PricingError, PricingResult};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// European option value under Black-Scholes with a continuous dividend yield.
///
/// Call = S·e^(-qT)·Phi(d1) - K·e^(-rT)·Phi(d2)
/// Put  = K·e^(-rT)·Phi(-d2) - S·e^(-qT)·Phi(-d1)
///
/// where d1 = (ln(S/K) + (r - q + sigma^2/2)·T) / (sigma·sqrt(T)) and
/// d2 = d1 - sigma·sqrt(T).
///
/// Returns `InvalidInput` instead of NaN when T, sigma, S or K is not
/// strictly positive.
pub fn price(
    spot: f64,
    strike: f64,
    ttl_years: f64,
    sigma: f64,
    rate: f64,
    dividend_yield: f64,
    kind: OptionKind,
) -> PricingResult<f64> {
    check_domain(spot, strike, ttl_years, sigma, rate, dividend_yield)?;

    let (d1, d2) = d1_d2(spot, strike, ttl_years, sigma, rate, dividend_yield);
    let normal = Normal::standard();
    let disc_spot = spot * (-dividend_yield * ttl_years).exp();
    let disc_strike = strike * (-rate * ttl_years).exp();

    let value = match kind {
        OptionKind::Call => disc_spot * normal.cdf(d1) - disc_strike * normal.cdf(d2),
        OptionKind::Put => disc_strike * normal.cdf(-d2) - disc_spot * normal.cdf(-d1),
    };
    Ok(value)
}

/// Analytic dPrice/dSigma, shared by calls and puts since d1 does not depend
/// on the option kind. Drives the Newton solve.
pub fn sigma_derivative(
    spot: f64,
    strike: f64,
    ttl_years: f64,
    sigma: f64,
    rate: f64,
    dividend_yield: f64,
) -> PricingResult<f64> {
    check_domain(spot, strike, ttl_years, sigma, rate, dividend_yield)?;

    let (d1, _) = d1_d2(spot, strike, ttl_years, sigma, rate, dividend_yield);
    let normal = Normal::standard();
    Ok(spot * (-dividend_yield * ttl_years).exp() * ttl_years.sqrt() * normal.pdf(d1))
}

#[inline]
pub(crate) fn d1_d2(
    spot: f64,
    strike: f64,
    ttl_years: f64,
    sigma: f64,
    rate: f64,
    dividend_yield: f64,
) -> (f64, f64) {
    let sigma_sqrt_t = sigma * ttl_years.sqrt();
    let d1 = ((spot / strike).ln() + (rate - dividend_yield + 0.5 * sigma * sigma) * ttl_years)
        / sigma_sqrt_t;
    (d1, d1 - sigma_sqrt_t)
}

fn check_domain(
    spot: f64,
    strike: f64,
    ttl_years: f64,
    sigma: f64,
    rate: f64,
    dividend_yield: f64,
) -> Result<(), PricingError> {
    positive(spot, "spot")?;
    positive(strike, "strike")?;
    positive(ttl_years, "time to expiry")?;
    positive(sigma, "volatility")?;
    finite(rate, "rate")?;
    non_negative(dividend_yield, "dividend yield")?;
    Ok(())
}
