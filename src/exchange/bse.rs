// src/exchange/bse.rs

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{endpoint, Config};
use crate::error::{Error, Result};
use crate::fetch::{self, zips};
use crate::parse::{parse_csv, Record};

const EQUITY_LIST_PATH: &str = "corporates/List_Scrips.aspx";
const INDICES_PATH: &str = "bseindia/api/Sensex/getSensexData";
const INDICES_FIELDS: &str = r#"{"fields":"2,3,4,5,6,7"}"#;
const QUOTE_PATH: &str = "BseIndiaAPI/api/StockReachGraph/w";
const PEER_PATH: &str = "BseIndiaAPI/api/EQPeerGp/w";

/// ASP.NET postback that makes the scrip list page answer with CSV.
const DEFAULT_FORM_BODY: &str = include_str!("bse_formdata.txt");

/// The scrip list page renders a full search result and is much slower than the API.
const EQUITY_LIST_TIMEOUT_FACTOR: u32 = 4;

const LISTING_KEY: &str = "isin_no";
const BHAVCOPY_KEY: &str = "sc_code";

/// Bombay Stock Exchange client.
#[derive(Debug, Clone)]
pub struct Bse {
    client: Client,
    site: Url,
    api: Url,
    timeout: Duration,
    form_body: Option<PathBuf>,
}

impl Bse {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            site: config.bse_url.clone(),
            api: config.bse_api_url.clone(),
            timeout: config.timeout(),
            form_body: config.bse_form_body.clone(),
        }
    }

    /// The configured postback body, read only when the listing is requested.
    async fn form_body(&self) -> Result<String> {
        let body = match &self.form_body {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?,
            None => DEFAULT_FORM_BODY.to_string(),
        };
        Ok(body.trim().to_string())
    }

    /// Every listed scrip (`security_code`, `isin_no`, ...).
    #[instrument(level = "info", skip(self))]
    pub async fn equity_list(&self) -> Result<Vec<Record>> {
        let url = endpoint(&self.site, EQUITY_LIST_PATH)?;
        let form = self.form_body().await?;
        let body = fetch::post_form(
            &self.client,
            &url,
            form,
            self.timeout.saturating_mul(EQUITY_LIST_TIMEOUT_FACTOR),
        )
        .await?;
        let records = parse_csv(&body, Some(LISTING_KEY))?;
        info!(rows = records.len(), "bse equity list");
        Ok(records)
    }

    /// SENSEX snapshot. The API wraps it in a one-element array.
    pub async fn indices(&self) -> Result<Value> {
        let url = endpoint(&self.api, INDICES_PATH)?;
        let value =
            fetch::get_json(&self.client, &url, &[("json", INDICES_FIELDS)], self.timeout).await?;
        match value {
            Value::Array(items) => items
                .into_iter()
                .next()
                .ok_or_else(|| Error::invalid("empty index list")),
            other => {
                debug!(?other, "unexpected index payload");
                Err(Error::invalid("index payload is not a list"))
            }
        }
    }

    /// Live quote for a scrip code such as `500209`.
    pub async fn quote(&self, scrip_code: &str) -> Result<Value> {
        let url = endpoint(&self.api, QUOTE_PATH)?;
        let query = [
            ("scripcode", scrip_code),
            ("flag", "0"),
            ("fromdate", ""),
            ("todate", ""),
            ("seriesid", ""),
        ];
        fetch::get_json(&self.client, &url, &query, self.timeout).await
    }

    /// Quote together with the scrip's peer group comparison table.
    pub async fn quote_with_comparison(&self, scrip_code: &str) -> Result<Value> {
        let url = endpoint(&self.api, PEER_PATH)?;
        let query = [("scripcode", scrip_code), ("scripcomare", "")];
        fetch::get_json(&self.client, &url, &query, self.timeout).await
    }

    /// End-of-day report for `date`, with ISIN codes.
    pub async fn bhavcopy(&self, date: NaiveDate, save: Option<&Path>) -> Result<Vec<Record>> {
        let url = endpoint(&self.site, &bhavcopy_path(date))?;
        zips::fetch_report(&self.client, &url, self.timeout, BHAVCOPY_KEY, save).await
    }
}

/// `download/BhavCopy/Equity/EQ_ISINCODE_020218.zip`
pub fn bhavcopy_path(date: NaiveDate) -> String {
    format!(
        "download/BhavCopy/Equity/EQ_ISINCODE_{}.zip",
        date.format("%d%m%y")
    )
}
