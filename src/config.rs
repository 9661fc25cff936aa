use std::env::{self, VarError};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::error::{AppError, Result};

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_MAX_UPLOAD_BYTES: &str = "16777216";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    /// Base of `/record`, `/stop` and `/search`. Always ends with `/`.
    pub backend_url: Url,
    pub summarize_url: Url,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Body limit of the console's file upload form.
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key))
    }

    /// Builds the configuration from an arbitrary key lookup, applying defaults
    /// for every key that is not present.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let var = |key: &str, default: &str| -> Result<String> {
            match lookup(key) {
                Ok(value) => Ok(value),
                Err(VarError::NotPresent) => Ok(default.to_string()),
                Err(err) => Err(AppError::from(err)),
            }
        };

        let host = var("HOST", "127.0.0.1")?;
        let port = var("PORT", "3000")?;
        let port = port
            .parse::<u16>()
            .map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let backend_url = parse_base_url(&var("BACKEND_URL", DEFAULT_BACKEND_URL)?)?;
        let summarize_url = match lookup("SUMMARIZE_URL") {
            Ok(raw) => Url::parse(&raw)
                .map_err(|e| AppError::ConfigError(format!("Invalid SUMMARIZE_URL: {}", e)))?,
            Err(VarError::NotPresent) => join(&backend_url, "summarize")?,
            Err(err) => return Err(err.into()),
        };

        let request_timeout = parse_secs("REQUEST_TIMEOUT_SECS", &var("REQUEST_TIMEOUT_SECS", "90")?)?;
        let connect_timeout = parse_secs("CONNECT_TIMEOUT_SECS", &var("CONNECT_TIMEOUT_SECS", "5")?)?;

        let max_upload_bytes = var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?
            .parse::<usize>()
            .map_err(|e| AppError::ConfigError(format!("Invalid MAX_UPLOAD_BYTES: {}", e)))?;

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            backend_url,
            summarize_url,
            request_timeout,
            connect_timeout,
            max_upload_bytes,
        })
    }

    /// Points the console at another backend. The summarize endpoint follows
    /// unless it was configured explicitly.
    pub fn with_backend_url(mut self, raw: &str) -> Result<Self> {
        let follows_backend = self.summarize_url == join(&self.backend_url, "summarize")?;
        self.backend_url = parse_base_url(raw)?;
        if follows_backend {
            self.summarize_url = join(&self.backend_url, "summarize")?;
        }
        Ok(self)
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        join(&self.backend_url, path)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| AppError::ConfigError(format!("Invalid BACKEND_URL: {}", e)))?;
    if url.cannot_be_a_base() {
        return Err(AppError::ConfigError(format!(
            "BACKEND_URL cannot be used as a base: {}",
            raw
        )));
    }
    // Url::join replaces the last segment unless the path ends with a slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| AppError::ConfigError(format!("Invalid endpoint {}: {}", path, e)))
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e)))
}
