//! Shared HTTP transport
//!
//! One `reqwest::Client` behind all three service roles, carrying the base
//! URL and a bearer token that can be swapped at runtime: a fresh login
//! replaces the token without rebuilding connection pools.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::RequestBuilder;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};

/// Maximum length of a response body quoted in logs
const MAX_LOGGED_BODY_LENGTH: usize = 500;

/// Transport shared by the issuer, validator and verifier roles
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    /// Lock-free reads on the request path; writes only on re-login
    bearer: ArcSwapOption<String>,
}

impl ApiClient {
    /// Build a transport from a validated configuration
    ///
    /// # Errors
    ///
    /// * `Config` if the configuration fails validation or the underlying
    ///   client cannot be constructed
    pub fn new(config: ApiConfig) -> ClientResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Config {
                reason: format!("failed to build http client: {e}"),
            })?;

        let bearer = ArcSwapOption::new(config.bearer_token().map(|t| Arc::new(t.to_owned())));

        Ok(Self {
            http,
            base_url: config.base_url().clone(),
            bearer,
        })
    }

    /// Replace the bearer token used by all future requests
    pub fn set_bearer_token(&self, token: impl Into<String>) {
        self.bearer.store(Some(Arc::new(token.into())));
    }

    /// Drop the bearer token; authorized calls fail fast until a new one is set
    pub fn clear_bearer_token(&self) {
        self.bearer.store(None);
    }

    /// Whether a bearer token is currently set
    pub fn has_bearer_token(&self) -> bool {
        self.bearer.load().is_some()
    }

    /// Service base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path under the base URL
    pub(crate) fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| ClientError::Config {
                reason: "base URL cannot carry endpoint paths".into(),
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    /// Start an authorized POST; fails fast when no bearer token is set
    pub(crate) fn authorized_post(&self, url: Url) -> ClientResult<RequestBuilder> {
        let token = self.bearer.load_full().ok_or(ClientError::Unauthorized)?;
        Ok(self.http.post(url).bearer_auth(token.as_str()))
    }
}

/// Redact codes from a response body and truncate it for a log line
///
/// Access codes grant entry while they are live; an error log is not the
/// place to leak one. Redaction runs on the full body: a body cut mid-JSON
/// no longer parses, and its raw prefix could still carry the code.
pub(crate) fn sanitize_body_for_log(body: &str) -> String {
    let redacted = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(mut json) => {
            if let Some(data) = json.get_mut("data") {
                if data.get("code").is_some() {
                    data["code"] = serde_json::json!("[REDACTED]");
                }
            }
            if json.get("code").is_some() {
                json["code"] = serde_json::json!("[REDACTED]");
            }
            json.to_string()
        }
        Err(_) => body.to_owned(),
    };

    if redacted.len() > MAX_LOGGED_BODY_LENGTH {
        let cut = redacted
            .char_indices()
            .take_while(|(i, _)| *i < MAX_LOGGED_BODY_LENGTH)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!(
            "{}... [truncated, {} total bytes]",
            &redacted[..cut],
            redacted.len()
        )
    } else {
        redacted
    }
}
