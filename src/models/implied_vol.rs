use crate::models::black_scholes::sigma_derivative;
use crate::models::{PricingError, PricingInput, PricingResult};

/// Starting guess for the Newton iteration.
pub const SOLVER_STARTING_VALUE: f64 = 0.27;

/// Converged once |model - premium| falls below this.
pub const IMPLIED_VOLATILITY_TOLERANCE: f64 = 1e-6;

/// Iteration budget before giving up.
pub const MAX_ITERATIONS: u32 = 100;

/// Initial upper end of the bracket. 1000% annualised vol.
const MAX_SIGMA: f64 = 10.0;

/// Newton-Raphson solve for the volatility that reproduces the observed premium.
///
/// Premiums outside the arbitrage-free interval are rejected before iterating,
/// since no volatility reproduces them. Price is increasing in sigma, so each
/// residual narrows a bracket around the root; a Newton step that lands
/// outside the bracket (or a vanishing derivative) falls back to bisection.
///
/// Never returns an unconverged value: running out of budget yields
/// `NonConvergence` with the last iterate attached.
pub fn implied_volatility(input: &PricingInput) -> PricingResult<f64> {
    let premium = input.premium();
    let (lower, upper) = input.premium_bounds();
    if premium <= lower || premium >= upper {
        return Err(PricingError::PremiumOutOfBounds { premium, lower, upper });
    }

    let mut sigma = SOLVER_STARTING_VALUE;
    let mut residual = f64::INFINITY;
    let (mut lo, mut hi) = (0.0_f64, MAX_SIGMA);

    for iteration in 1..=MAX_ITERATIONS {
        residual = input.price_at(sigma)? - premium;
        if residual.abs() < IMPLIED_VOLATILITY_TOLERANCE {
            tracing::trace!(iteration, sigma, "implied volatility converged");
            return Ok(sigma);
        }

        if residual > 0.0 {
            hi = sigma;
        } else {
            lo = sigma;
        }

        let slope = sigma_derivative(
            input.spot(),
            input.strike(),
            input.ttl_years(),
            sigma,
            input.rate(),
            input.dividend_yield(),
        )?;

        let newton = if slope > f64::EPSILON {
            sigma - residual / slope
        } else {
            f64::NAN
        };
        // NaN fails both comparisons and takes the bisection branch
        sigma = if newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
    }

    Err(PricingError::NonConvergence {
        iterations: MAX_ITERATIONS,
        last_estimate: sigma,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{price, OptionKind};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_atm_scenario() {
        // premium at sigma=0.20 exactly
        let p = price(100.0, 100.0, 0.5, 0.2, 0.05, 0.0, OptionKind::Call).unwrap();
        assert_abs_diff_eq!(p, 6.888_728_6, epsilon = 1e-6);
        let input = PricingInput::new(100.0, 100.0, 0.5, p, 0.05, 0.0, OptionKind::Call).unwrap();
        assert_abs_diff_eq!(implied_volatility(&input).unwrap(), 0.2, epsilon = 1e-4);
    }

    #[test]
    fn test_quoted_premium_scenario() {
        let input = PricingInput::new(100.0, 100.0, 0.5, 6.80, 0.05, 0.0, OptionKind::Call).unwrap();
        let iv = implied_volatility(&input).unwrap();
        assert_abs_diff_eq!(iv, 0.196_756, epsilon = 1e-4);
    }

    #[test]
    fn test_put_with_dividend() {
        let p = price(50.0, 55.0, 0.25, 0.45, 0.03, 0.02, OptionKind::Put).unwrap();
        let input = PricingInput::new(50.0, 55.0, 0.25, p, 0.03, 0.02, OptionKind::Put).unwrap();
        assert_abs_diff_eq!(implied_volatility(&input).unwrap(), 0.45, epsilon = 1e-4);
    }

    #[test]
    fn test_premium_below_intrinsic_rejected() {
        // call worth at least S - K*e^(-rT) ~ 20.5
        let input = PricingInput::new(120.0, 100.0, 0.1, 15.0, 0.05, 0.0, OptionKind::Call).unwrap();
        let err = implied_volatility(&input).unwrap_err();
        assert!(matches!(err, PricingError::PremiumOutOfBounds { .. }), "got {err:?}");
    }

    #[test]
    fn test_premium_above_spot_rejected() {
        let input = PricingInput::new(100.0, 100.0, 0.5, 150.0, 0.05, 0.0, OptionKind::Call).unwrap();
        assert!(matches!(
            implied_volatility(&input),
            Err(PricingError::PremiumOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_zero_premium_rejected() {
        let input = PricingInput::new(100.0, 150.0, 0.5, 0.0, 0.05, 0.0, OptionKind::Call).unwrap();
        assert!(implied_volatility(&input).is_err());
    }

    #[test]
    fn test_high_vol_otm_recovers() {
        let p = price(100.0, 160.0, 0.3, 1.8, 0.02, 0.0, OptionKind::Call).unwrap();
        let input = PricingInput::new(100.0, 160.0, 0.3, p, 0.02, 0.0, OptionKind::Call).unwrap();
        assert_abs_diff_eq!(implied_volatility(&input).unwrap(), 1.8, epsilon = 1e-4);
    }

    #[test]
    fn test_unreachable_premium_reports_non_convergence() {
        // within bounds, but needs sigma far above the bracket at T=0.02
        let input = PricingInput::new(100.0, 100.0, 0.02, 99.0, 0.0, 0.0, OptionKind::Call).unwrap();
        match implied_volatility(&input) {
            Err(PricingError::NonConvergence { iterations, last_estimate, residual }) => {
                assert_eq!(iterations, MAX_ITERATIONS);
                assert!(last_estimate > 9.0, "last={last_estimate}");
                assert!(residual < 0.0);
            }
            other => panic!("expected non-convergence, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn round_trip_reprices_premium(
            moneyness in 0.5_f64..1.6,
            ttl in 0.003_f64..5.0,
            sigma in 0.05_f64..3.0,
            rate in 0.0_f64..0.08,
            q in 0.0_f64..0.04,
            is_call in any::<bool>(),
        ) {
            let kind = if is_call { OptionKind::Call } else { OptionKind::Put };
            let spot = 100.0;
            let strike = spot * moneyness;
            let premium = price(spot, strike, ttl, sigma, rate, q, kind).unwrap();
            let input = PricingInput::new(spot, strike, ttl, premium, rate, q, kind).unwrap();
            let (lower, upper) = input.premium_bounds();
            // rounding can pin deep ITM/OTM premiums onto a bound
            prop_assume!(premium > lower && premium < upper);

            let solved = implied_volatility(&input).unwrap();
            let residual = input.price_at(solved).unwrap() - premium;
            prop_assert!(residual.abs() < IMPLIED_VOLATILITY_TOLERANCE, "residual={}", residual);

            // sigma is only pinned down where the price is sensitive to it
            let vega = sigma_derivative(spot, strike, ttl, sigma, rate, q).unwrap();
            if vega > 1.0 {
                prop_assert!((solved - sigma).abs() < 1e-4, "sigma={} solved={}", sigma, solved);
            }
        }
    }
}
