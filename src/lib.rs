//! Equity quotes and option chains from Yahoo Finance, with Black-Scholes
//! implied volatility and finite-difference Greeks priced against a
//! treasury-derived risk-free curve.

pub mod config;
pub mod errors;
pub mod feeds;
pub mod market;
pub mod models;
pub mod yahoo;

pub use errors::{QuoteError, QuoteResult};
pub use market::{fetch_option, ChainRequest, OptionChain, OptionQuote, Stock};
pub use models::{Greeks, OptionKind, PricingError, RateCurve};
