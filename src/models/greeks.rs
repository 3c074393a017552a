use crate::models::black_scholes::price;
use crate::models::implied_vol::implied_volatility;
use crate::models::{PricingInput, PricingResult};

/// Spot step for delta.
pub const DELTA_DIFFERENTIAL: f64 = 1e-3;
/// Spot step for gamma.
pub const GAMMA_DIFFERENTIAL: f64 = 1e-3;
/// Volatility step for vega.
pub const VEGA_DIFFERENTIAL: f64 = 1e-4;
/// Time step (years) for theta.
pub const THETA_DIFFERENTIAL: f64 = 1e-5;
/// Rate step for rho.
pub const RHO_DIFFERENTIAL: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    /// Per 1% move in volatility.
    pub vega: f64,
    /// Per calendar day of time to expiry.
    pub theta: f64,
    /// Per 1% move in the risk-free rate.
    pub rho: f64,
}

/// Implied volatility solved once for a `PricingInput`, with every Greek
/// evaluated by central differences around that same volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    input: PricingInput,
    implied_vol: f64,
}

impl Valuation {
    pub fn new(input: PricingInput) -> PricingResult<Self> {
        let implied_vol = implied_volatility(&input)?;
        Ok(Self { input, implied_vol })
    }

    #[inline]
    pub fn input(&self) -> &PricingInput {
        &self.input
    }

    #[inline]
    pub fn implied_volatility(&self) -> f64 {
        self.implied_vol
    }

    /// Re-price with selected inputs bumped. Everything else, including the
    /// solved volatility, comes from this valuation.
    fn bumped(&self, d_spot: f64, d_ttl: f64, d_sigma: f64, d_rate: f64) -> PricingResult<f64> {
        let i = &self.input;
        price(
            i.spot() + d_spot,
            i.strike(),
            i.ttl_years() + d_ttl,
            self.implied_vol + d_sigma,
            i.rate() + d_rate,
            i.dividend_yield(),
            i.kind(),
        )
    }

    pub fn delta(&self) -> PricingResult<f64> {
        let h = DELTA_DIFFERENTIAL;
        let up = self.bumped(h, 0.0, 0.0, 0.0)?;
        let down = self.bumped(-h, 0.0, 0.0, 0.0)?;
        Ok((up - down) / (2.0 * h))
    }

    pub fn gamma(&self) -> PricingResult<f64> {
        let h = GAMMA_DIFFERENTIAL;
        let up = self.bumped(h, 0.0, 0.0, 0.0)?;
        let mid = self.bumped(0.0, 0.0, 0.0, 0.0)?;
        let down = self.bumped(-h, 0.0, 0.0, 0.0)?;
        Ok((up - 2.0 * mid + down) / (h * h))
    }

    pub fn vega(&self) -> PricingResult<f64> {
        let h = VEGA_DIFFERENTIAL;
        let up = self.bumped(0.0, 0.0, h, 0.0)?;
        let down = self.bumped(0.0, 0.0, -h, 0.0)?;
        Ok((up - down) / (2.0 * h * 100.0))
    }

    /// dPrice/dT scaled to one calendar day.
    pub fn theta(&self) -> PricingResult<f64> {
        let h = THETA_DIFFERENTIAL;
        let up = self.bumped(0.0, h, 0.0, 0.0)?;
        let down = self.bumped(0.0, -h, 0.0, 0.0)?;
        Ok((up - down) / (2.0 * h * 365.0))
    }

    pub fn rho(&self) -> PricingResult<f64> {
        let h = RHO_DIFFERENTIAL;
        let up = self.bumped(0.0, 0.0, 0.0, h)?;
        let down = self.bumped(0.0, 0.0, 0.0, -h)?;
        Ok((up - down) / (2.0 * h * 100.0))
    }

    pub fn greeks(&self) -> PricingResult<Greeks> {
        Ok(Greeks {
            delta: self.delta()?,
            gamma: self.gamma()?,
            vega: self.vega()?,
            theta: self.theta()?,
            rho: self.rho()?,
        })
    }
}
