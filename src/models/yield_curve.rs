/// Term structure of the risk-free rate. The pricing core only ever asks
/// for a rate at a given time to expiry.
pub trait RateCurve: Send + Sync {
    /// Annualised risk-free rate for a maturity of `ttl_years`.
    fn rate(&self, ttl_years: f64) -> f64;
}

/// Constant rate, used when no published curve is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatRate(pub f64);

impl RateCurve for FlatRate {
    #[inline]
    fn rate(&self, _ttl_years: f64) -> f64 {
        self.0
    }
}

/// Published maturities in years: overnight, 1/2/3/6 months, 1/2/3/5/7/10/20/30 years.
pub const TENORS: [f64; 13] = [
    0.0,
    1.0 / 12.0,
    2.0 / 12.0,
    3.0 / 12.0,
    6.0 / 12.0,
    1.0,
    2.0,
    3.0,
    5.0,
    7.0,
    10.0,
    20.0,
    30.0,
];

/// Piecewise-linear yield curve over (maturity, rate) knots sorted by maturity.
/// Outside the knots the nearest endpoint rate is used.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldCurve {
    points: Vec<(f64, f64)>,
}

impl YieldCurve {
    /// Returns `None` when no knot survives (all non-finite).
    pub fn new(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut points: Vec<(f64, f64)> = points
            .into_iter()
            .filter(|(t, r)| t.is_finite() && r.is_finite())
            .collect();
        if points.is_empty() {
            return None;
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.dedup_by(|later, earlier| later.0 == earlier.0);
        Some(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

impl RateCurve for YieldCurve {
    fn rate(&self, ttl_years: f64) -> f64 {
        let pts = &self.points;
        // `new` guarantees at least one knot
        let (first, last) = (pts[0], pts[pts.len() - 1]);
        if ttl_years.is_nan() || ttl_years <= first.0 {
            return first.1;
        }
        if ttl_years >= last.0 {
            return last.1;
        }

        let idx = pts.partition_point(|&(t, _)| t <= ttl_years);
        let (t0, r0) = pts[idx - 1];
        let (t1, r1) = pts[idx];
        r0 + (r1 - r0) * (ttl_years - t0) / (t1 - t0)
    }
}
