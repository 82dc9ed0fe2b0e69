use chrono::NaiveDate;
use reqwest::{header, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{apply_auth, TokenManager};
use crate::comments::Comments;
use crate::config::ClientConfig;
use crate::cutoff;
use crate::error::{Error, Result};
use crate::prediction_sets::PredictionSets;
use crate::questions::Questions;
use crate::request::{describe, Query};
use crate::response::read_json;

pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = header::HeaderMap::new();

    let user_agent = format!("rfi/{}", env!("CARGO_PKG_VERSION"));
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&user_agent)
            .map_err(|e| Error::config(format!("invalid user agent: {}", e)))?,
    );
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))
}

/// Async client for the RFI API.
///
/// Cloning is cheap; clones share the HTTP connection pool and the token
/// cache.
///
/// ```no_run
/// # async fn run() -> rfi::Result<()> {
/// use rfi::{Client, ListQuestions};
///
/// let client = Client::from_env()?;
/// let open = client.questions().list(&ListQuestions::default()).await?;
/// if let Some(first) = client.questions().get(open.questions[0].id, None).await? {
///     println!("{}", first.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenManager,
    cutoff_override: Option<NaiveDate>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.normalized_base_url()?;
        let http = build_http_client(config.timeout)?;
        let tokens = TokenManager::new(
            http.clone(),
            &base_url,
            config.credentials,
            config.access_token,
        );

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                tokens,
                cutoff_override: config.cutoff_override,
            }),
        })
    }

    /// Shorthand for `Client::new(ClientConfig::from_env()?)`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn questions(&self) -> Questions<'_> {
        Questions::new(self)
    }

    pub fn prediction_sets(&self) -> PredictionSets<'_> {
        PredictionSets::new(self)
    }

    pub fn comments(&self) -> Comments<'_> {
        Comments::new(self)
    }

    /// Effective cutoff for a call that asked for `requested`.
    pub fn cutoff(&self, requested: Option<NaiveDate>) -> NaiveDate {
        cutoff::resolve(self.inner.cutoff_override, requested)
    }

    /// Authenticated GET of `path` (relative to the base URL).
    ///
    /// A 401 triggers one token refresh and one retry of the same request;
    /// a second 401 is reported as [`Error::Authentication`].
    pub async fn get_json(&self, path: &str, query: &Query) -> Result<Value> {
        let url = format!("{}{}", self.inner.base_url, path);
        log::debug!("{}", describe("GET", path, query));

        let token = self.inner.tokens.token().await?;
        let resp = self.send(&url, query, &token).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return read_json(resp).await;
        }

        log::warn!("{} answered 401, refreshing token and retrying once", path);
        let token = self.inner.tokens.refresh(&token).await?;
        let resp = self.send(&url, query, &token).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication(format!(
                "{} rejected the refreshed token: {}",
                path,
                body.chars().take(200).collect::<String>()
            )));
        }
        read_json(resp).await
    }

    async fn send(&self, url: &str, query: &Query, token: &str) -> Result<reqwest::Response> {
        let mut builder = self.inner.http.get(url);
        if !query.is_empty() {
            builder = builder.query(query.pairs());
        }
        let builder = apply_auth(builder, token);
        Ok(builder.send().await?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn new_rejects_missing_credentials() {
        let err = Client::new(ClientConfig::new()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn new_trims_base_url() {
        let client = Client::new(
            ClientConfig::new()
                .base_url("https://custom.example.com/")
                .access_token("t"),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://custom.example.com");
    }

    #[test]
    fn default_base_url() {
        let client = Client::new(ClientConfig::new().credentials("a@b.c", "pw")).unwrap();
        assert_eq!(client.base_url(), "https://www.randforecastinginitiative.org");
    }

    #[test]
    fn cutoff_override_wins() {
        let forced = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let asked = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let client = Client::new(
            ClientConfig::new()
                .access_token("t")
                .cutoff_override(Some(forced)),
        )
        .unwrap();
        assert_eq!(client.cutoff(Some(asked)), forced);
        assert_eq!(client.cutoff(None), forced);

        let client = Client::new(ClientConfig::new().access_token("t")).unwrap();
        assert_eq!(client.cutoff(Some(asked)), asked);
        assert_eq!(client.cutoff(None), cutoff::today());
    }
}
