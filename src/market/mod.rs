pub mod chain;
pub mod option;
pub mod stock;

pub use chain::{ChainRequest, OptionChain};
pub use option::{fetch_option, OptionQuote};
pub use stock::Stock;
