pub mod client;
pub mod history;
pub mod types;

pub use client::YahooClient;
pub use types::{Frequency, HistoryBar, OptionContract};
