// src/config.rs

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};

/// Environment variable consulted when no `--config` path is given.
pub const CONFIG_ENV: &str = "SHAREWATCH_CONFIG";

const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Runtime settings. Every field has a default, so an empty YAML file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base of the NSE website.
    pub nse_url: Url,
    /// Base of the BSE website (equity list, bhavcopy archives).
    pub bse_url: Url,
    /// Base of the BSE JSON API (indices, quotes).
    pub bse_api_url: Url,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Replacement for the bundled BSE equity-list postback body.
    pub bse_form_body: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nse_url: parse_static("https://www.nseindia.com/"),
            bse_url: parse_static("https://www.bseindia.com/"),
            bse_api_url: parse_static("https://api.bseindia.com/"),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            bse_form_body: None,
        }
    }
}

fn parse_static(s: &str) -> Url {
    Url::parse(s).expect("built-in URL should parse")
}

impl Config {
    /// Load from `path`, falling back to `$SHAREWATCH_CONFIG`, then to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p),
            None => {
                debug!("no config file; using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        let cfg = Self::from_yaml(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Point every endpoint at one host; used to run against a local stand-in server.
    pub fn with_base(mut self, base: &Url) -> Self {
        self.nse_url = base.clone();
        self.bse_url = base.clone();
        self.bse_api_url = base.clone();
        self
    }
}

/// Resolve `path` against a configured base URL.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| Error::Config(format!("bad endpoint {}{}: {}", base, path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_point_at_live_exchanges() {
        let cfg = Config::default();
        assert_eq!(cfg.nse_url.host_str(), Some("www.nseindia.com"));
        assert_eq!(cfg.bse_api_url.host_str(), Some("api.bseindia.com"));
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() -> Result<()> {
        let cfg = Config::from_yaml("timeout_secs: 12\nnse_url: http://localhost:8080/\n")?;
        assert_eq!(cfg.timeout_secs, 12);
        assert_eq!(cfg.nse_url.as_str(), "http://localhost:8080/");
        assert_eq!(cfg.bse_url.host_str(), Some("www.bseindia.com"));
        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_yaml("timeout: 3\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn loads_from_file() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "user_agent: sharewatch-test")?;
        let cfg = Config::load(Some(tmp.path()))?;
        assert_eq!(cfg.user_agent, "sharewatch-test");
        Ok(())
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::from_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn endpoint_joins_relative_paths() -> Result<()> {
        let base = Url::parse("http://127.0.0.1:9000").map_err(|e| Error::Config(e.to_string()))?;
        let url = endpoint(&base, "/homepage/Indices1.json")?;
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/homepage/Indices1.json");
        Ok(())
    }
}
