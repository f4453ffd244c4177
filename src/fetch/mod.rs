// src/fetch/mod.rs

use reqwest::{header, Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};

pub mod zips;

/// Build the one HTTP client shared by every request of a run.
pub fn build_client(config: &Config) -> Result<Client> {
    Ok(Client::builder()
        .cookie_store(true)
        .gzip(true)
        .user_agent(config.user_agent.as_str())
        .build()?)
}

async fn send_text(req: RequestBuilder, url: &Url) -> Result<String> {
    let body = req.send().await?.error_for_status()?.text().await?;
    trace!(%url, bytes = body.len(), "received body");
    if body.trim().is_empty() {
        debug!(%url, "blank response");
        return Err(Error::BlankResponse);
    }
    Ok(body)
}

/// GET `url` and return the body as text. An empty body is an error.
#[instrument(level = "debug", skip(client, query), fields(url = %url))]
pub async fn get_text(
    client: &Client,
    url: &Url,
    query: &[(&str, &str)],
    timeout: Duration,
) -> Result<String> {
    let req = client.get(url.clone()).query(query).timeout(timeout);
    send_text(req, url).await
}

/// POST a pre-encoded `application/x-www-form-urlencoded` body and return the reply text.
#[instrument(level = "debug", skip(client, body), fields(url = %url, body_len = body.len()))]
pub async fn post_form(client: &Client, url: &Url, body: String, timeout: Duration) -> Result<String> {
    let req = client
        .post(url.clone())
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .timeout(timeout);
    send_text(req, url).await
}

/// GET `url` and decode the body as JSON.
pub async fn get_json(
    client: &Client,
    url: &Url,
    query: &[(&str, &str)],
    timeout: Duration,
) -> Result<Value> {
    let body = get_text(client, url, query, timeout).await?;
    serde_json::from_str(&body).map_err(|e| Error::invalid(format!("{} is not JSON: {}", url, e)))
}

/// GET `url` as raw bytes. A zero-length body is an error.
#[instrument(level = "debug", skip(client), fields(url = %url))]
pub async fn get_bytes(client: &Client, url: &Url, timeout: Duration) -> Result<Vec<u8>> {
    let bytes = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    if bytes.is_empty() {
        return Err(Error::BlankResponse);
    }
    debug!(bytes = bytes.len(), "downloaded");
    Ok(bytes.to_vec())
}
