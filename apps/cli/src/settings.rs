//! Layered CLI configuration
//!
//! Precedence, lowest to highest: built-in defaults, the TOML config file,
//! `TURNSTILE_*` environment variables, command-line flags.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::Args;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};
use url::Url;

use turnstile_client::ApiClient;
use turnstile_client::config::{ApiConfig, DEFAULT_REQUEST_TIMEOUT};

/// Baseline every other layer merges over
const DEFAULTS: &str = r#"
base_url = "http://localhost:3000"
request_timeout = "10s"
"#;

/// Connection flags shared by every subcommand
#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Validation service base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<Url>,

    /// Session bearer token from the login flow
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Path to a TOML config file
    #[arg(long, global = true, env = "TURNSTILE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Resolved connection settings for one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Validation service base URL
    pub base_url: Url,

    /// Session bearer token, if a login has happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub request_timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

impl Settings {
    /// Build the client configuration these settings describe
    pub fn api_config(&self) -> Result<ApiConfig> {
        let mut config = ApiConfig::new(self.base_url.clone())
            .context("invalid base URL")?
            .with_request_timeout(self.request_timeout);
        if let Some(token) = &self.token {
            config = config.with_bearer_token(token);
        }
        config.validate().context("invalid connection settings")?;
        Ok(config)
    }

    /// Build a shared API client
    pub fn api_client(&self) -> Result<Arc<ApiClient>> {
        let client = ApiClient::new(self.api_config()?).context("building API client")?;
        Ok(Arc::new(client))
    }
}

/// Load settings, applying command-line overrides last
pub fn load(args: &ConnectionArgs) -> Result<Settings> {
    let mut figment = Figment::from(Toml::string(DEFAULTS));
    if let Some(path) = resolve_config_file(args.config.as_deref())? {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed("TURNSTILE_"));

    let mut settings: Settings = figment.extract().context("loading configuration")?;
    if let Some(url) = &args.base_url {
        settings.base_url = url.clone();
    }
    if let Some(token) = &args.token {
        settings.token = Some(token.clone());
    }
    Ok(settings)
}

/// An explicit config path must exist; the default location is optional
fn resolve_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        ensure!(
            path.exists(),
            "config file {} does not exist",
            path.display()
        );
        return Ok(Some(path.to_owned()));
    }
    Ok(dirs::config_dir()
        .map(|dir| dir.join("turnstile").join("config.toml"))
        .filter(|path| path.exists()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_args() -> ConnectionArgs {
        ConnectionArgs {
            base_url: None,
            token: None,
            config: None,
        }
    }

    #[test]
    fn defaults_resolve_without_any_input() {
        let settings = load(&no_args()).unwrap();
        assert_eq!(settings.base_url.as_str(), "http://localhost:3000/");
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn flags_override_the_defaults() {
        let args = ConnectionArgs {
            base_url: Some("https://validation.campus.example".parse().unwrap()),
            token: Some("session-token".into()),
            config: None,
        };
        let settings = load(&args).unwrap();
        assert_eq!(settings.base_url.host_str(), Some("validation.campus.example"));
        assert_eq!(settings.token.as_deref(), Some("session-token"));
    }

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        let args = ConnectionArgs {
            base_url: None,
            token: None,
            config: Some(PathBuf::from("/nonexistent/turnstile.toml")),
        };
        assert!(load(&args).is_err());
    }

    #[test]
    fn env_layers_over_the_config_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "turnstile.toml",
                r#"
                    base_url = "https://file.example"
                    token = "from-file"
                "#,
            )?;
            jail.set_env("TURNSTILE_TOKEN", "from-env");

            let args = ConnectionArgs {
                base_url: None,
                token: None,
                config: Some(PathBuf::from("turnstile.toml")),
            };
            let settings = load(&args).unwrap();
            assert_eq!(settings.base_url.host_str(), Some("file.example"));
            assert_eq!(settings.token.as_deref(), Some("from-env"));
            Ok(())
        });
    }

    #[test]
    fn settings_without_a_token_build_a_client() {
        let settings = load(&no_args()).unwrap();
        assert!(settings.api_client().is_ok());
    }
}
