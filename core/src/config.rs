//! Client configuration and account credentials.
//!
//! Both are plain values passed in by the caller. Nothing is read from
//! process state unless the caller asks for it through `from_env`.

use serde::Deserialize;
use url::Url;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://aei.ai";
pub const DEFAULT_API_VERSION: &str = "v1";

/// Where the service lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Bare host, e.g. `https://aei.ai`. Account endpoints hang off it.
    pub base_url: String,
    /// Version segment for resource endpoints (`/api/{api_version}`).
    pub api_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Read `AEI_BASE_URL` and `AEI_API_VERSION`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("AEI_BASE_URL").unwrap_or(defaults.base_url),
            api_version: std::env::var("AEI_API_VERSION").unwrap_or(defaults.api_version),
        }
    }

    /// Trim trailing slashes and reject empty fields. The base URL must be
    /// an absolute `http` or `https` URL.
    pub fn normalized(&self) -> Result<Self, ApiError> {
        let base_url = self.base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::InvalidConfig("base_url is empty".to_string()));
        }
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidConfig(format!("base_url `{base_url}`: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ApiError::InvalidConfig(format!(
                "base_url `{base_url}` must be an http(s) URL with a host"
            )));
        }
        let api_version = self.api_version.trim_matches('/');
        if api_version.is_empty() {
            return Err(ApiError::InvalidConfig("api_version is empty".to_string()));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            api_version: api_version.to_string(),
        })
    }
}

/// Account credentials for `register` and `login`.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    /// Only `register` needs it; see `require_email`.
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

impl Credentials {
    /// Read `AEI_USERNAME`, `AEI_EMAIL` and `AEI_PASSWORD`. `AEI_EMAIL` may
    /// be unset; an empty value counts as unset.
    pub fn from_env() -> Result<Self, ApiError> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| ApiError::InvalidConfig(format!("{name} is not set")))
        };
        Ok(Self {
            username: var("AEI_USERNAME")?,
            email: std::env::var("AEI_EMAIL").ok().filter(|e| !e.is_empty()),
            password: var("AEI_PASSWORD")?,
        })
    }

    /// The email to register with. Missing or empty is `InvalidConfig`.
    pub fn require_email(&self) -> Result<&str, ApiError> {
        self.email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ApiError::InvalidConfig("an email is required to register".to_string()))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
