use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;
use shared::config::ClientConfig;
use shared::models::ErrorResponse;
use thiserror::Error;
use url::Url;

use crate::key::ResourceKey;

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, FetchError>> + Send + 'a>>;

/// The single error condition a resource can end up in. Network failures,
/// non-2xx responses and undecodable payloads all normalize to this.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    pub status: Option<u16>,
    pub details: Option<String>,
}

impl FetchError {
    pub fn new(key: &ResourceKey, status: Option<u16>, details: Option<String>) -> Self {
        Self {
            message: key.failure_message().to_string(),
            status,
            details,
        }
    }

    pub(crate) fn undecodable(key: &ResourceKey, err: &serde_json::Error) -> Self {
        Self::new(key, None, Some(format!("invalid payload: {err}")))
    }
}

/// Transport used by the cache to load a key.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, key: &'a ResourceKey) -> FetchFuture<'a>;
}

/// Fetches keys as JSON GETs against the conversation API.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self::with_client(client, config.base_url.clone()))
    }

    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn endpoint(&self, key: &ResourceKey) -> Option<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(key.path_segments());

        let query = key.query_pairs();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Some(url)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, key: &'a ResourceKey) -> FetchFuture<'a> {
        Box::pin(async move {
            let url = self
                .endpoint(key)
                .ok_or_else(|| FetchError::new(key, None, Some("invalid base url".to_string())))?;

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|err| {
                    FetchError::new(
                        key,
                        err.status().map(|status| status.as_u16()),
                        Some(err.to_string()),
                    )
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::new(
                    key,
                    Some(status.as_u16()),
                    error_details(&body),
                ));
            }

            response
                .json::<Value>()
                .await
                .map_err(|err| FetchError::new(key, None, Some(err.to_string())))
        })
    }
}

fn error_details(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok()?;
    match parsed.details {
        Some(details) => Some(format!("{}: {details}", parsed.error)),
        None => Some(parsed.error),
    }
}
