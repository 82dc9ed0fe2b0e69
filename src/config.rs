//! Client configuration.
//!
//! Values come from constructor arguments or the environment:
//!
//! | Variable        | Meaning                                   |
//! |-----------------|-------------------------------------------|
//! | `RFI_EMAIL`     | account email for the password grant      |
//! | `RFI_PASSWORD`  | account password                          |
//! | `RFI_TOKEN`     | bearer token to use before any exchange   |
//! | `RFI_BASE_URL`  | API root, defaults to [`DEFAULT_BASE_URL`] |
//! | `CUTOFF_DATE`   | `YYYY-MM-DD`, forces every query's cutoff |

use chrono::NaiveDate;
use std::env;
use std::time::Duration;

use crate::auth::{Auth, Credentials};
use crate::cutoff;
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.randforecastinginitiative.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENV_EMAIL: &str = "RFI_EMAIL";
pub const ENV_PASSWORD: &str = "RFI_PASSWORD";
pub const ENV_TOKEN: &str = "RFI_TOKEN";
pub const ENV_BASE_URL: &str = "RFI_BASE_URL";
pub const ENV_CUTOFF_DATE: &str = "CUTOFF_DATE";

pub(crate) fn get_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub credentials: Option<Credentials>,
    pub access_token: Option<String>,
    /// Harness-level cutoff that replaces every per-call `cutoff_date`.
    pub cutoff_override: Option<NaiveDate>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            credentials: None,
            access_token: None,
            cutoff_override: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the `RFI_*` variables and `CUTOFF_DATE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(get_env)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let (Some(email), Some(password)) = (lookup(ENV_EMAIL), lookup(ENV_PASSWORD)) {
            config.credentials = Some(Credentials::new(email, password));
        }
        config.access_token = lookup(ENV_TOKEN);
        config.cutoff_override = lookup(ENV_CUTOFF_DATE)
            .map(|s| cutoff::parse_date(&s))
            .transpose()?;
        Ok(config)
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn credentials(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(email, password));
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn auth(self, auth: Auth) -> Self {
        match auth {
            Auth::Password(creds) => self.credentials(creds.email, creds.password),
            Auth::Bearer(token) => self.access_token(token),
        }
    }

    pub fn cutoff_override(mut self, date: Option<NaiveDate>) -> Self {
        self.cutoff_override = date;
        self
    }

    /// Base URL without a trailing slash, checked to be absolute http(s).
    pub fn normalized_base_url(&self) -> Result<String> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let url = reqwest::Url::parse(trimmed)
            .map_err(|e| Error::config(format!("invalid base URL '{}': {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base URL must be http or https: {}",
                self.base_url
            )));
        }
        Ok(trimmed.to_string())
    }

    pub fn validate(&self) -> Result<()> {
        self.normalized_base_url()?;
        if self.credentials.is_none() && self.access_token.is_none() {
            return Err(Error::config(format!(
                "RFI credentials required. Set {} and {} environment variables \
                 or pass email/password (or a token) to the client",
                ENV_EMAIL, ENV_PASSWORD
            )));
        }
        if let Some(creds) = &self.credentials {
            if creds.email.is_empty() || creds.password.is_empty() {
                return Err(Error::config("email and password must both be non-empty"));
            }
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than zero"));
        }
        Ok(())
    }
}
