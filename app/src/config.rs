//! Hosted backend configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const REST_PATH: &str = "rest/v1/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Raw settings for the hosted backend.
///
/// Values layer from `WILD_ROBOT_*` environment variables, configuration
/// files and command-line arguments.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "WILD_ROBOT")]
pub struct BackendSettings {
    /// Project base URL, for example `https://abc.backend.example`.
    pub url: Option<String>,
    /// Public anonymous API key sent with every gateway request.
    pub anon_key: Option<String>,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 10)]
    pub request_timeout_secs: u64,
}

/// Validated connection details for the REST table gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEndpoint {
    /// Root of the REST table gateway, always ending in `rest/v1/`.
    pub rest_root: Url,
    /// Anonymous API key sent in the `apikey` header.
    pub anon_key: String,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

/// Reasons the backend settings cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A configuration layer could not be read or parsed.
    #[error("failed to load backend settings: {0}")]
    Load(String),
    /// `WILD_ROBOT_URL` is unset or blank.
    #[error("backend url is not configured")]
    MissingUrl,
    /// `WILD_ROBOT_ANON_KEY` is unset or blank.
    #[error("backend anon key is not configured")]
    MissingAnonKey,
    /// The URL does not parse or cannot serve as a base.
    #[error("backend url `{url}` is invalid: {reason}")]
    InvalidUrl {
        /// The configured value.
        url: String,
        /// Parser explanation.
        reason: String,
    },
    /// `WILD_ROBOT_REQUEST_TIMEOUT_SECS` is zero.
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
}

impl BackendSettings {
    /// Load settings from the process environment and arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a layer cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os()).map_err(|err| ConfigError::Load(err.to_string()))
    }

    /// Validate the settings into a gateway endpoint.
    ///
    /// # Errors
    ///
    /// Fails when the URL or anon key is missing or blank, the URL does not
    /// parse as an absolute URL, or the timeout is zero.
    pub fn endpoint(&self) -> Result<GatewayEndpoint, ConfigError> {
        let raw_url = non_blank(self.url.as_deref()).ok_or(ConfigError::MissingUrl)?;
        let anon_key = non_blank(self.anon_key.as_deref()).ok_or(ConfigError::MissingAnonKey)?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(GatewayEndpoint {
            rest_root: rest_root(raw_url)?,
            anon_key: anon_key.to_owned(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn rest_root(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_owned(),
        reason,
    };
    let mut base = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("url cannot be a base".to_owned()));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    if base.path().ends_with(REST_PATH) {
        return Ok(base);
    }
    base.join(REST_PATH).map_err(|err| invalid(err.to_string()))
}
