// src/exchange/nse.rs

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use std::{path::Path, time::Duration};
use tracing::{info, instrument};
use url::Url;

use crate::config::{endpoint, Config};
use crate::error::Result;
use crate::fetch::{self, zips};
use crate::parse::{extract_embedded_json, parse_csv, Record};

const EQUITY_LIST_PATH: &str = "content/equities/EQUITY_L.csv";
const INDICES_PATH: &str = "homepage/Indices1.json";
const QUOTE_PATH: &str = "live_market/dynaContent/live_watch/get_quote/GetQuote.jsp";
const SECTOR_PATH: &str = "live_market/dynaContent/live_watch/get_quote/getPEDetails.jsp";

/// Column every NSE listing and bhavcopy carries.
const KEY_COLUMN: &str = "symbol";

/// National Stock Exchange client.
#[derive(Debug, Clone)]
pub struct Nse {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl Nse {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base: config.nse_url.clone(),
            timeout: config.timeout(),
        }
    }

    /// Every listed equity, one record per security (`symbol`, `isin_number`, ...).
    #[instrument(level = "info", skip(self))]
    pub async fn equity_list(&self) -> Result<Vec<Record>> {
        let url = endpoint(&self.base, EQUITY_LIST_PATH)?;
        let body = fetch::get_text(&self.client, &url, &[], self.timeout).await?;
        let records = parse_csv(&body, Some(KEY_COLUMN))?;
        info!(rows = records.len(), "nse equity list");
        Ok(records)
    }

    /// Live index levels (NIFTY 50 and friends).
    pub async fn indices(&self) -> Result<Value> {
        let url = endpoint(&self.base, INDICES_PATH)?;
        fetch::get_json(&self.client, &url, &[], self.timeout).await
    }

    /// Live quote for `symbol`; the payload is embedded in the quote page's HTML.
    #[instrument(level = "debug", skip(self))]
    pub async fn quote(&self, symbol: &str) -> Result<Value> {
        let url = endpoint(&self.base, QUOTE_PATH)?;
        let html = fetch::get_text(&self.client, &url, &[("symbol", symbol)], self.timeout).await?;
        extract_embedded_json(&html)
    }

    /// Sector and P/E details for `symbol`.
    pub async fn sector_details(&self, symbol: &str) -> Result<Value> {
        let url = endpoint(&self.base, SECTOR_PATH)?;
        fetch::get_json(&self.client, &url, &[("symbol", symbol)], self.timeout).await
    }

    /// End-of-day report for `date`.
    pub async fn bhavcopy(&self, date: NaiveDate, save: Option<&Path>) -> Result<Vec<Record>> {
        let url = endpoint(&self.base, &bhavcopy_path(date))?;
        zips::fetch_report(&self.client, &url, self.timeout, KEY_COLUMN, save).await
    }
}

/// `content/historical/EQUITIES/2018/FEB/cm02FEB2018bhav.csv.zip`
pub fn bhavcopy_path(date: NaiveDate) -> String {
    let year = date.format("%Y");
    let month = date.format("%b").to_string().to_uppercase();
    let day = date.format("%d");
    format!(
        "content/historical/EQUITIES/{}/{}/cm{}{}{}bhav.csv.zip",
        year, month, day, month, year
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fetch::{build_client, zips::zipped};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn nse_for(server: &MockServer) -> Nse {
        let base = Url::parse(&server.uri()).unwrap();
        let config = Config::default().with_base(&base);
        Nse::new(build_client(&config).unwrap(), &config)
    }

    #[test]
    fn bhavcopy_path_uses_upper_month() {
        let date = NaiveDate::from_ymd_opt(2018, 2, 2).unwrap();
        assert_eq!(
            bhavcopy_path(date),
            "content/historical/EQUITIES/2018/FEB/cm02FEB2018bhav.csv.zip"
        );
    }

    #[tokio::test]
    async fn equity_list_from_csv() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/content/equities/EQUITY_L.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "SYMBOL,NAME OF COMPANY, SERIES, ISIN NUMBER\n\
                 INFY,Infosys Limited,EQ,INE009A01021\n\
                 BHEL,Bharat Heavy Electricals Limited,EQ,INE257A01026\n",
            ))
            .mount(&server)
            .await;

        let records = nse_for(&server).await.equity_list().await?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["isin_number"].as_deref(), Some("INE257A01026"));
        Ok(())
    }

    #[tokio::test]
    async fn blank_equity_list_is_not_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let err = nse_for(&server).await.equity_list().await.unwrap_err();
        assert!(matches!(err, Error::BlankResponse));
    }

    #[tokio::test]
    async fn quote_from_embedded_json() -> Result<()> {
        let server = MockServer::start().await;
        let payload = json!({ "data": [{ "symbol": "INFY", "lastPrice": "1,150.20" }] });
        let html = format!(
            "<html>\n<div id=\"responseDiv\" style=\"display:none\">\n{}\n</div>\n</html>",
            payload
        );
        Mock::given(method("GET"))
            .and(path(format!("/{}", QUOTE_PATH)))
            .and(query_param("symbol", "INFY"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let quote = nse_for(&server).await.quote("INFY").await?;
        assert_eq!(quote, payload);
        Ok(())
    }

    #[tokio::test]
    async fn indices_and_sector_details_pass_json_through() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/homepage/Indices1.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"mktOpen":false,"data":[]}"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", SECTOR_PATH)))
            .and(query_param("symbol", "INFY"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"sector":"IT"}"#))
            .mount(&server)
            .await;

        let nse = nse_for(&server).await;
        assert_eq!(nse.indices().await?, json!({ "mktOpen": false, "data": [] }));
        assert_eq!(nse.sector_details("INFY").await?["sector"], "IT");
        Ok(())
    }

    #[tokio::test]
    async fn bhavcopy_for_date() -> Result<()> {
        let server = MockServer::start().await;
        let csv = "SYMBOL,SERIES,OPEN,CLOSE,TIMESTAMP,ISIN,\n\
                   INFY,EQ,1150.2,1160.4,02-FEB-2018,INE009A01021,\n";
        Mock::given(method("GET"))
            .and(path("/content/historical/EQUITIES/2018/FEB/cm02FEB2018bhav.csv.zip"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(zipped(&[("cm02FEB2018bhav.csv", csv)])),
            )
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2018, 2, 2).unwrap();
        let records = nse_for(&server).await.bhavcopy(date, None).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["close"].as_deref(), Some("1160.4"));
        Ok(())
    }
}
