use std::env;

use url::Url;

use crate::error::ConfigError;

/// Base endpoint used when `LEARN_PROGRESS_API_URL` is unset.
pub const DEFAULT_PROGRESS_API_URL: &str = "https://localhost:7018/api/progress";

/// Environment variable overriding the progress endpoint.
pub const PROGRESS_API_URL_ENV: &str = "LEARN_PROGRESS_API_URL";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressApiConfig {
    pub base_url: Url,
}

impl ProgressApiConfig {
    /// Parse and validate a base endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the url does not parse or cannot take path segments.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::NotABase(base_url.to_string()));
        }
        Ok(Self { base_url })
    }

    /// Read the endpoint from the environment, falling back to the default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configured url is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_setting(env::var(PROGRESS_API_URL_ENV).ok().as_deref())
    }

    /// Build from an optional raw setting; unset or blank means the default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a non-blank value is not a usable base url.
    pub fn from_setting(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw {
            Some(raw) if !raw.trim().is_empty() => Self::new(raw),
            _ => Ok(Self::default()),
        }
    }
}

impl Default for ProgressApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_PROGRESS_API_URL)
                .expect("default progress url should be valid"),
        }
    }
}
