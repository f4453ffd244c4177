//! Fetch listings, index levels, quotes and end-of-day reports from the NSE and
//! BSE websites and normalize them into JSON values and flat records.

pub mod cli;
pub mod config;
pub mod error;
pub mod exchange;
pub mod fetch;
pub mod parse;

pub use config::Config;
pub use error::{Error, Result};
pub use exchange::{Bse, Exchange, Nse, Platform};
pub use parse::Record;
