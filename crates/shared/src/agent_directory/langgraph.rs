use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use super::{AgentDirectory, AgentDirectoryError, AgentDirectoryFuture, RunInput, ThreadSearchQuery};
use crate::config::AgentDirectoryConfig;
use crate::models::AgentThread;

const API_KEY_HEADER: &str = "x-api-key";
const MAX_LOGGED_BODY_CHARS: usize = 512;

/// `AgentDirectory` backed by a LangGraph server's HTTP API.
#[derive(Clone)]
pub struct LangGraphDirectory {
    client: reqwest::Client,
    base_url: Url,
}

impl LangGraphDirectory {
    pub fn new(config: &AgentDirectoryConfig) -> Result<Self, reqwest::Error> {
        let mut default_headers = HeaderMap::new();
        if let Some(api_key) = config.api_key.as_deref()
            && let Ok(value) = api_key.parse::<HeaderValue>()
        {
            default_headers.insert(API_KEY_HEADER, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(default_headers)
            .build()?;

        Ok(Self::with_client(client, config.api_url.clone()))
    }

    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Appends escaped path segments to the base URL, keeping any base path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AgentDirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AgentDirectoryError::InvalidPayload(format!(
                    "base url {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<T, AgentDirectoryError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = truncate(&body, MAX_LOGGED_BODY_CHARS);
            warn!(operation, status = status.as_u16(), "agent directory request failed");
            return Err(AgentDirectoryError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(AgentDirectoryError::Unavailable)?;
        serde_json::from_slice::<T>(&body).map_err(|err| {
            warn!(operation, "agent directory payload did not decode: {err}");
            AgentDirectoryError::InvalidPayload(format!("{operation}: {err}"))
        })
    }
}

impl AgentDirectory for LangGraphDirectory {
    fn search_threads<'a>(
        &'a self,
        query: ThreadSearchQuery,
    ) -> AgentDirectoryFuture<'a, Vec<AgentThread>> {
        Box::pin(async move {
            debug!(limit = query.limit, "searching agent threads");
            let response = self
                .client
                .post(self.endpoint(&["threads", "search"])?)
                .json(&query)
                .send()
                .await
                .map_err(AgentDirectoryError::Unavailable)?;

            Self::read_json("threads.search", response).await
        })
    }

    fn get_thread<'a>(&'a self, thread_id: &'a str) -> AgentDirectoryFuture<'a, AgentThread> {
        Box::pin(async move {
            debug!(thread_id, "fetching agent thread");
            let response = self
                .client
                .get(self.endpoint(&["threads", thread_id])?)
                .send()
                .await
                .map_err(AgentDirectoryError::Unavailable)?;

            Self::read_json("threads.get", response).await
        })
    }

    fn run_and_wait<'a>(
        &'a self,
        thread_id: &'a str,
        assistant_id: &'a str,
        input: RunInput,
    ) -> AgentDirectoryFuture<'a, Value> {
        Box::pin(async move {
            debug!(thread_id, assistant_id, "starting agent run");
            let response = self
                .client
                .post(self.endpoint(&["threads", thread_id, "runs", "wait"])?)
                .json(&json!({
                    "assistant_id": assistant_id,
                    "input": input,
                }))
                .send()
                .await
                .map_err(AgentDirectoryError::Unavailable)?;

            Self::read_json("runs.wait", response).await
        })
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::{LangGraphDirectory, truncate};

    fn directory(base_url: &str) -> LangGraphDirectory {
        let base_url = Url::parse(base_url).expect("base url should parse");
        LangGraphDirectory::with_client(reqwest::Client::new(), base_url)
    }

    #[test]
    fn endpoints_extend_the_base_path() {
        let endpoint = directory("http://127.0.0.1:2024/")
            .endpoint(&["threads", "search"])
            .expect("endpoint should build");
        assert_eq!(endpoint.as_str(), "http://127.0.0.1:2024/threads/search");

        let endpoint = directory("https://agents.example.com/langgraph/")
            .endpoint(&["threads", "t-1", "runs", "wait"])
            .expect("endpoint should build");
        assert_eq!(
            endpoint.as_str(),
            "https://agents.example.com/langgraph/threads/t-1/runs/wait"
        );
    }

    #[test]
    fn thread_ids_are_escaped() {
        let endpoint = directory("http://127.0.0.1:2024")
            .endpoint(&["threads", "a/b?c"])
            .expect("endpoint should build");
        assert_eq!(endpoint.as_str(), "http://127.0.0.1:2024/threads/a%2Fb%3Fc");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
