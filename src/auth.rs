use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Lifetime assumed when the token endpoint does not send `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(7200);
/// Tokens are treated as expired this long before the server says so.
pub const REFRESH_BUFFER: Duration = Duration::from_secs(300);
pub const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// keep the password out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Auth {
    Password(Credentials),
    Bearer(String),
}

impl FromStr for Auth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(token) = s.strip_prefix("bearer:").or_else(|| s.strip_prefix("Bearer:")) {
            if token.is_empty() {
                return Err(Error::config("Bearer token cannot be empty"));
            }
            return Ok(Auth::Bearer(token.to_string()));
        }

        // emails never contain ':', so the first one splits
        match s.split_once(':') {
            Some((email, password)) => {
                if email.is_empty() {
                    return Err(Error::config("Email cannot be empty"));
                }
                if password.is_empty() {
                    return Err(Error::config("Password cannot be empty"));
                }
                Ok(Auth::Password(Credentials::new(email, password)))
            }
            None => Err(Error::config(format!(
                "Invalid auth '{}'. Expected 'email:password' or 'bearer:TOKEN'",
                s
            ))),
        }
    }
}

pub fn apply_auth(builder: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
    builder.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token))
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    /// `None` for tokens handed to us from outside, or whose lifetime
    /// overflows the clock.
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at.is_none_or(|at| Instant::now() < at)
    }
}

/// Bearer token cache with OAuth2 password-grant refresh.
///
/// The lock is held across the token request so concurrent callers wait for
/// one exchange instead of each starting their own.
pub struct TokenManager {
    http: reqwest::Client,
    token_url: String,
    credentials: Option<Credentials>,
    state: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        credentials: Option<Credentials>,
        access_token: Option<String>,
    ) -> Self {
        let state = access_token.map(|value| CachedToken {
            value,
            expires_at: None,
        });
        Self {
            http,
            token_url: format!("{}/oauth/token", base_url.trim_end_matches('/')),
            credentials,
            state: Mutex::new(state),
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.credentials.is_some()
    }

    /// Returns the cached token, exchanging credentials when it is missing
    /// or about to expire.
    pub async fn token(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        if let Some(cached) = state.as_ref().filter(|t| t.is_fresh()) {
            return Ok(cached.value.clone());
        }
        let fresh = self.exchange().await?;
        let value = fresh.value.clone();
        *state = Some(fresh);
        Ok(value)
    }

    /// Replaces a token the API rejected.
    ///
    /// If another caller already swapped `rejected` out, that newer token is
    /// returned without a second exchange.
    pub async fn refresh(&self, rejected: &str) -> Result<String> {
        let mut state = self.state.lock().await;
        if let Some(cached) = state.as_ref() {
            if cached.value != rejected && cached.is_fresh() {
                return Ok(cached.value.clone());
            }
        }
        *state = None;
        let fresh = self.exchange().await?;
        let value = fresh.value.clone();
        *state = Some(fresh);
        Ok(value)
    }

    async fn exchange(&self) -> Result<CachedToken> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            Error::Authentication("no email/password available to obtain a new token".into())
        })?;

        log::info!("requesting access token for {}", credentials.email);

        let form = [
            ("grant_type", "password"),
            ("email", credentials.email.as_str()),
            ("password", credentials.password.as_str()),
        ];
        let resp = self
            .http
            .post(&self.token_url)
            .timeout(TOKEN_TIMEOUT)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Authentication(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                text.chars().take(200).collect::<String>()
            )));
        }

        let grant: TokenGrant = serde_json::from_str(&text)?;
        Ok(CachedToken {
            expires_at: expiry(Instant::now(), grant.expires_in),
            value: grant.access_token,
        })
    }
}

/// Refresh deadline for a token granted at `now`. A lifetime too large to
/// represent means no known expiry; the token is then kept until a 401.
fn expiry(now: Instant, expires_in: Option<u64>) -> Option<Instant> {
    let lifetime = expires_in
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME)
        .saturating_sub(REFRESH_BUFFER);
    now.checked_add(lifetime)
}

// ============================================================================
// Tests
// ============================================================================
