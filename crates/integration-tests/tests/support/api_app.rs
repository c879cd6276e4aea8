use std::sync::Arc;
use std::time::Duration;

use api_server::http::{AppState, build_router};
use shared::agent_directory::LangGraphDirectory;
use url::Url;

pub const CONVERSATION_LIST_LIMIT: u32 = 20;

pub fn build_test_router(agent_base_url: &str) -> axum::Router {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("http client should initialize");
    let base_url = Url::parse(agent_base_url).expect("agent base url should parse");

    build_router(AppState {
        directory: Arc::new(LangGraphDirectory::with_client(http_client, base_url)),
        conversation_list_limit: CONVERSATION_LIST_LIMIT,
    })
}

/// The proxy API served over TCP, for clients that speak real HTTP.
pub struct TestApiServer {
    pub base_url: Url,
    handle: tokio::task::JoinHandle<()>,
}

impl TestApiServer {
    pub async fn start(agent_base_url: &str) -> Self {
        let app = build_test_router(agent_base_url);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("api listener should bind");
        let bind_addr = listener
            .local_addr()
            .expect("api listener local address should exist");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("api server should run");
        });

        Self {
            base_url: Url::parse(&format!("http://{bind_addr}/")).expect("api url should parse"),
            handle,
        }
    }
}

impl Drop for TestApiServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
