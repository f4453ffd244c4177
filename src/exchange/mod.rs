// src/exchange/mod.rs

use chrono::NaiveDate;
use clap::ValueEnum;
use futures::future::try_join_all;
use reqwest::Client;
use serde_json::Value;
use std::{fmt, path::Path};
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parse::Record;

pub mod bse;
pub mod nse;

pub use bse::Bse;
pub use nse::Nse;

/// Which exchange to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Platform {
    Nse,
    Bse,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Nse => "nse",
            Platform::Bse => "bse",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One client per platform behind a single surface.
#[derive(Debug, Clone)]
pub enum Exchange {
    Nse(Nse),
    Bse(Bse),
}

impl Exchange {
    pub fn new(platform: Platform, client: Client, config: &Config) -> Self {
        match platform {
            Platform::Nse => Exchange::Nse(Nse::new(client, config)),
            Platform::Bse => Exchange::Bse(Bse::new(client, config)),
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Exchange::Nse(_) => Platform::Nse,
            Exchange::Bse(_) => Platform::Bse,
        }
    }

    fn unsupported(&self, operation: &'static str) -> Error {
        Error::Unsupported {
            platform: self.platform().as_str(),
            operation,
        }
    }

    pub async fn equity_list(&self) -> Result<Vec<Record>> {
        match self {
            Exchange::Nse(x) => x.equity_list().await,
            Exchange::Bse(x) => x.equity_list().await,
        }
    }

    pub async fn indices(&self) -> Result<Value> {
        match self {
            Exchange::Nse(x) => x.indices().await,
            Exchange::Bse(x) => x.indices().await,
        }
    }

    /// `code` is a ticker symbol on NSE and a scrip code on BSE.
    pub async fn quote(&self, code: &str) -> Result<Value> {
        match self {
            Exchange::Nse(x) => x.quote(code).await,
            Exchange::Bse(x) => x.quote(code).await,
        }
    }

    pub async fn quote_with_comparison(&self, code: &str) -> Result<Value> {
        match self {
            Exchange::Bse(x) => x.quote_with_comparison(code).await,
            Exchange::Nse(_) => Err(self.unsupported("quote_with_comparison")),
        }
    }

    pub async fn sector_details(&self, symbol: &str) -> Result<Value> {
        match self {
            Exchange::Nse(x) => x.sector_details(symbol).await,
            Exchange::Bse(_) => Err(self.unsupported("sector_details")),
        }
    }

    pub async fn bhavcopy(&self, date: NaiveDate, save: Option<&Path>) -> Result<Vec<Record>> {
        match self {
            Exchange::Nse(x) => x.bhavcopy(date, save).await,
            Exchange::Bse(x) => x.bhavcopy(date, save).await,
        }
    }

    /// Fetch every code concurrently. Results keep the order of `codes`; the first
    /// failure fails the whole batch.
    #[instrument(level = "info", skip(self), fields(platform = %self.platform()))]
    pub async fn quotes(&self, codes: &[String], with_peers: bool) -> Result<Vec<Value>> {
        let quotes = try_join_all(codes.iter().map(|code| async move {
            if with_peers {
                self.quote_with_comparison(code).await
            } else {
                self.quote(code).await
            }
        }))
        .await?;
        info!(count = quotes.len(), "fetched quotes");
        Ok(quotes)
    }
}
