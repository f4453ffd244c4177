// src/cli.rs

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::exchange::{Exchange, Platform};
use crate::fetch::build_client;

#[derive(Parser, Debug)]
#[command(
    name = "sharewatch",
    author,
    version,
    about = "Live and end-of-day market data from NSE and BSE, printed as JSON"
)]
pub struct Cli {
    /// Exchange to query: `nse` or `bse`.
    #[arg(short, long, global = true, value_enum, ignore_case = true)]
    pub platform: Option<Platform>,

    /// YAML config file (defaults to $SHAREWATCH_CONFIG when set).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-request timeout in seconds, overriding the config.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// All listed equities of a platform.
    EquityList,
    /// Live index data of a platform.
    Indices,
    /// Live quotes; platform defaults to nse.
    Quote {
        /// Comma separated NSE symbols or BSE scrip codes, e.g. "infy, bhel".
        #[arg(short, long)]
        codes: Option<String>,
        /// Include the peer group comparison (bse only).
        #[arg(long)]
        peers: bool,
    },
    /// Sector and P/E details of an NSE symbol.
    Sector {
        #[arg(short, long)]
        symbol: String,
    },
    /// End-of-day report (bhavcopy) for a date.
    Bhavcopy {
        /// Trading date, YYYY-MM-DD.
        #[arg(short, long)]
        date: Option<String>,
        /// Also keep the downloaded archive at this path.
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

impl Cli {
    /// Config from `--config`/env, with `--timeout` applied on top.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
        Ok(config)
    }

    fn platform(&self) -> Result<Platform> {
        match (&self.command, self.platform) {
            (_, Some(p)) => Ok(p),
            (Command::Quote { .. }, None) | (Command::Sector { .. }, None) => Ok(Platform::Nse),
            (_, None) => Err(Error::InvalidOption(
                "--platform is required (nse or bse)".into(),
            )),
        }
    }
}

/// Split `"infy, bhel"` into trimmed, non-empty codes.
pub fn parse_codes(raw: &str) -> Result<Vec<String>> {
    let codes: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if codes.is_empty() {
        return Err(Error::InvalidOption("no codes given".into()));
    }
    Ok(codes)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidOption(format!("bad date `{}` (want YYYY-MM-DD): {}", raw, e)))
}

/// Execute the parsed command and return the JSON document to print.
pub async fn run(cli: &Cli, config: &Config) -> Result<String> {
    let platform = cli.platform()?;
    let client = build_client(config)?;
    let exchange = Exchange::new(platform, client, config);
    info!(%platform, command = ?cli.command, "running");

    let output = match &cli.command {
        Command::EquityList => serde_json::to_string(&exchange.equity_list().await?)?,
        Command::Indices => serde_json::to_string(&exchange.indices().await?)?,
        Command::Quote { codes, peers } => {
            let codes = parse_codes(codes.as_deref().unwrap_or(""))?;
            serde_json::to_string(&exchange.quotes(&codes, *peers).await?)?
        }
        Command::Sector { symbol } => {
            serde_json::to_string(&exchange.sector_details(symbol).await?)?
        }
        Command::Bhavcopy { date, save } => {
            let date = date
                .as_deref()
                .ok_or_else(|| Error::InvalidOption("--date is required".into()))
                .and_then(parse_date)?;
            serde_json::to_string(&exchange.bhavcopy(date, save.as_deref()).await?)?
        }
    };
    debug!(bytes = output.len(), "rendered output");
    Ok(output)
}
