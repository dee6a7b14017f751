//! Process configuration, read once at startup.
//!
//! Everything comes from the environment (a `.env` file is loaded first when
//! present). API keys are optional so the service can boot and report
//! `"missing"` on `/health` instead of refusing to start.

use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_GEMINI_MODEL: &str = "models/gemini-2.5-flash";
pub const DEFAULT_VISION_BASE_URL: &str = "https://vision.googleapis.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_LANGUAGE_HINTS: &[&str] = &["zh", "en"];
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Phone screenshots encoded as base64 routinely pass axum's 2 MB default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid socket address: {value}")]
    InvalidBindAddr { name: &'static str, value: String },
    #[error("{name} is not a valid http(s) URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("{name} must be a positive number of seconds, got {value}")]
    InvalidTimeout { name: &'static str, value: String },
    #[error("{name} must be a positive number of bytes, got {value}")]
    InvalidBodyLimit { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub vision_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub vision_base_url: String,
    pub gemini_base_url: String,
    pub language_hints: Vec<String>,
    pub vision_referer: Option<String>,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

// Keys stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("vision_api_key", &self.vision_api_key.as_ref().map(|_| "<set>"))
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<set>"))
            .field("gemini_model", &self.gemini_model)
            .field("vision_base_url", &self.vision_base_url)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("language_hints", &self.language_hints)
            .field("vision_referer", &self.vision_referer)
            .field("request_timeout", &self.request_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = match get("BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidBindAddr {
                name: "BIND_ADDR",
                value,
            })?,
            None => DEFAULT_BIND_ADDR
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr {
                    name: "BIND_ADDR",
                    value: DEFAULT_BIND_ADDR.to_string(),
                })?,
        };

        let gemini_model = normalize_model_name(
            &get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        );

        let vision_base_url = base_url(
            "VISION_BASE_URL",
            get("VISION_BASE_URL").unwrap_or_else(|| DEFAULT_VISION_BASE_URL.to_string()),
        )?;
        let gemini_base_url = base_url(
            "GEMINI_BASE_URL",
            get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        )?;

        let language_hints = match get("OCR_LANGUAGE_HINTS") {
            Some(raw) => raw
                .split(',')
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect(),
            None => DEFAULT_LANGUAGE_HINTS.iter().map(|h| h.to_string()).collect(),
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        name: "REQUEST_TIMEOUT_SECS",
                        value,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(value) => match value.parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(ConfigError::InvalidBodyLimit {
                        name: "MAX_BODY_BYTES",
                        value,
                    })
                }
            },
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            bind_addr,
            vision_api_key: get("GOOGLE_VISION_API_KEY"),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model,
            vision_base_url,
            gemini_base_url,
            language_hints,
            vision_referer: get("VISION_REFERER"),
            request_timeout,
            max_body_bytes,
        })
    }
}

/// `gemini-2.5-flash` → `models/gemini-2.5-flash`; already-qualified names pass through.
fn normalize_model_name(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

fn base_url(name: &'static str, value: String) -> Result<String, ConfigError> {
    let parsed = Url::parse(&value).map_err(|_| ConfigError::InvalidUrl {
        name,
        value: value.clone(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl { name, value });
    }
    Ok(value.trim_end_matches('/').to_string())
}
