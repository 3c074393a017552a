pub mod treasury;

pub use treasury::{fetch_yield_curve, risk_free_curve};
