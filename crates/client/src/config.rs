//! Client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the campus validation service
///
/// # Example
///
/// ```rust,ignore
/// let config = ApiConfig::new("https://validation.campus.example".parse()?)?
///     .with_bearer_token("session-token");
/// let api = ApiClient::new(config)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Service base URL; endpoint paths are appended to it
    base_url: Url,

    /// Session token from the login flow, if one has happened yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bearer_token: Option<String>,

    /// Per-request timeout
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    request_timeout: Duration,
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

impl ApiConfig {
    /// Create a configuration with validation
    ///
    /// # Errors
    ///
    /// * `Config` if the URL scheme is not http/https
    pub fn new(base_url: Url) -> ClientResult<Self> {
        let config = Self {
            base_url,
            bearer_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the bearer token presented on every request
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Override the per-request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> ClientResult<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ClientError::Config {
                reason: format!(
                    "base URL must use http or https, got {}",
                    self.base_url.scheme()
                ),
            });
        }
        if self.base_url.cannot_be_a_base() {
            return Err(ClientError::Config {
                reason: "base URL must be hierarchical".into(),
            });
        }
        if let Some(token) = &self.bearer_token {
            if token.trim().is_empty() {
                return Err(ClientError::Config {
                    reason: "bearer token must not be empty when set".into(),
                });
            }
        }
        if self.request_timeout.is_zero() {
            return Err(ClientError::Config {
                reason: "request_timeout must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Service base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Configured bearer token, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        "https://validation.campus.example".parse().unwrap()
    }

    #[test]
    fn accepts_https_base_url() {
        let config = ApiConfig::new(base()).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.bearer_token(), None);
    }

    #[test]
    fn rejects_non_http_scheme() {
        let url: Url = "ftp://validation.campus.example".parse().unwrap();
        let err = ApiConfig::new(url).unwrap_err();
        assert!(matches!(err, ClientError::Config { ref reason } if reason.contains("ftp")));
    }

    #[test]
    fn rejects_blank_bearer_token() {
        let config = ApiConfig::new(base()).unwrap().with_bearer_token("   ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserialises_timeout_from_humantime() {
        let json = r#"{"base_url": "https://validation.campus.example/", "request_timeout": "30s"}"#;
        let config: ApiConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.bearer_token(), None);
    }
}
