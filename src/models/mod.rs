pub mod black_scholes;
pub mod greeks;
pub mod implied_vol;
pub mod yield_curve;

pub use black_scholes::price;
pub use greeks::{Greeks, Valuation};
pub use implied_vol::implied_volatility;
pub use yield_curve::{FlatRate, RateCurve, YieldCurve};

/// Smallest time-to-expiry (years) a valuation accepts. Equal to the theta
/// step so that `T - h` never leaves the formula's domain.
pub const MIN_TIME_TO_EXPIRY: f64 = greeks::THETA_DIFFERENTIAL;

/// Failures of the pricing core. Cheap to clone so a quote can keep the
/// outcome of its valuation alongside the market fields.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("invalid pricing input: {0}")]
    InvalidInput(String),

    #[error("premium {premium} outside arbitrage-free bounds ({lower}, {upper})")]
    PremiumOutOfBounds { premium: f64, lower: f64, upper: f64 },

    #[error("implied volatility did not converge after {iterations} iterations (last={last_estimate}, residual={residual})")]
    NonConvergence {
        iterations: u32,
        last_estimate: f64,
        residual: f64,
    },
}

pub type PricingResult<T> = Result<T, PricingError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    /// Whether a contract of this kind at `strike` is in the money at `spot`.
    #[inline]
    pub fn in_the_money(self, spot: f64, strike: f64) -> bool {
        match self {
            Self::Call => spot > strike,
            Self::Put => spot < strike,
        }
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "Call"),
            Self::Put => write!(f, "Put"),
        }
    }
}

impl std::str::FromStr for OptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(Self::Call),
            "put" | "p" => Ok(Self::Put),
            other => Err(format!("unknown option kind: {other}")),
        }
    }
}

/// Market observables for one valuation. Validated once, immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingInput {
    spot: f64,
    strike: f64,
    ttl_years: f64,
    premium: f64,
    rate: f64,
    dividend_yield: f64,
    kind: OptionKind,
}

impl PricingInput {
    pub fn new(
        spot: f64,
        strike: f64,
        ttl_years: f64,
        premium: f64,
        rate: f64,
        dividend_yield: f64,
        kind: OptionKind,
    ) -> PricingResult<Self> {
        positive(spot, "spot")?;
        positive(strike, "strike")?;
        finite(ttl_years, "time to expiry")?;
        if ttl_years <= MIN_TIME_TO_EXPIRY {
            return Err(PricingError::InvalidInput(format!(
                "time to expiry must exceed {MIN_TIME_TO_EXPIRY} years, got {ttl_years}"
            )));
        }
        non_negative(premium, "premium")?;
        finite(rate, "rate")?;
        non_negative(dividend_yield, "dividend yield")?;

        Ok(Self {
            spot,
            strike,
            ttl_years,
            premium,
            rate,
            dividend_yield,
            kind,
        })
    }

    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    #[inline]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    #[inline]
    pub fn ttl_years(&self) -> f64 {
        self.ttl_years
    }

    #[inline]
    pub fn premium(&self) -> f64 {
        self.premium
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    #[inline]
    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Black-Scholes value of this contract at volatility `sigma`.
    #[inline]
    pub fn price_at(&self, sigma: f64) -> PricingResult<f64> {
        price(
            self.spot,
            self.strike,
            self.ttl_years,
            sigma,
            self.rate,
            self.dividend_yield,
            self.kind,
        )
    }

    /// Open interval of premiums consistent with no arbitrage.
    pub fn premium_bounds(&self) -> (f64, f64) {
        let fwd_spot = self.spot * (-self.dividend_yield * self.ttl_years).exp();
        let pv_strike = self.strike * (-self.rate * self.ttl_years).exp();
        match self.kind {
            OptionKind::Call => ((fwd_spot - pv_strike).max(0.0), fwd_spot),
            OptionKind::Put => ((pv_strike - fwd_spot).max(0.0), pv_strike),
        }
    }
}

pub(crate) fn positive(value: f64, name: &str) -> PricingResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PricingError::InvalidInput(format!(
            "{name} must be positive and finite, got {value}"
        )));
    }
    Ok(value)
}

pub(crate) fn non_negative(value: f64, name: &str) -> PricingResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(PricingError::InvalidInput(format!(
            "{name} must be non-negative and finite, got {value}"
        )));
    }
    Ok(value)
}

pub(crate) fn finite(value: f64, name: &str) -> PricingResult<f64> {
    if !value.is_finite() {
        return Err(PricingError::InvalidInput(format!("{name} must be finite, got {value}")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_time() {
        let err = PricingInput::new(100.0, 100.0, 0.0, 5.0, 0.05, 0.0, OptionKind::Call).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_time_below_theta_step() {
        let res = PricingInput::new(100.0, 100.0, 1e-6, 5.0, 0.05, 0.0, OptionKind::Call);
        assert!(res.is_err(), "T -> 0+ must be rejected");
    }

    #[test]
    fn test_rejects_bad_strike_and_nan() {
        assert!(PricingInput::new(100.0, 0.0, 0.5, 5.0, 0.05, 0.0, OptionKind::Put).is_err());
        assert!(PricingInput::new(f64::NAN, 100.0, 0.5, 5.0, 0.05, 0.0, OptionKind::Put).is_err());
        assert!(PricingInput::new(100.0, 100.0, 0.5, -1.0, 0.05, 0.0, OptionKind::Put).is_err());
        assert!(PricingInput::new(100.0, 100.0, 0.5, 1.0, 0.05, -0.01, OptionKind::Put).is_err());
    }

    #[test]
    fn test_negative_rate_allowed() {
        assert!(PricingInput::new(100.0, 100.0, 0.5, 5.0, -0.005, 0.0, OptionKind::Call).is_ok());
    }

    #[test]
    fn test_premium_bounds() {
        let call = PricingInput::new(120.0, 100.0, 1.0, 25.0, 0.0, 0.0, OptionKind::Call).unwrap();
        assert_eq!(call.premium_bounds(), (20.0, 120.0));
        let put = PricingInput::new(120.0, 100.0, 1.0, 1.0, 0.0, 0.0, OptionKind::Put).unwrap();
        assert_eq!(put.premium_bounds(), (0.0, 100.0));
    }

    #[test]
    fn test_kind_parse_and_itm() {
        assert_eq!("PUT".parse::<OptionKind>().unwrap(), OptionKind::Put);
        assert_eq!("call".parse::<OptionKind>().unwrap(), OptionKind::Call);
        assert!("straddle".parse::<OptionKind>().is_err());
        assert!(OptionKind::Call.in_the_money(110.0, 100.0));
        assert!(!OptionKind::Put.in_the_money(110.0, 100.0));
        assert!(!OptionKind::Call.in_the_money(100.0, 100.0));
    }
}
