mod support;

use std::sync::Arc;
use std::time::Duration;

use conversation_cache::{CacheStore, ChatSession, ConversationClient, HttpFetcher, ResourceKey};
use serde_json::{Value, json};
use shared::models::{MessageRole, SendMessageResponse};
use shared::thread::{conversation_title, thread_messages};
use tokio::time::timeout;

use support::agent_mock::{MockAgentServer, thread};
use support::api_app::TestApiServer;

const WAIT: Duration = Duration::from_secs(5);

fn client_for(api: &TestApiServer) -> ConversationClient {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("http client should initialize");
    let fetcher = HttpFetcher::with_client(http_client, api.base_url.clone());
    ConversationClient::new(CacheStore::new(), Arc::new(fetcher))
}

async fn post_message(api: &TestApiServer, thread_id: &str, message: &str) -> SendMessageResponse {
    let url = api
        .base_url
        .join(&format!("api/conversations/{thread_id}"))
        .expect("message url should build");
    reqwest::Client::new()
        .post(url)
        .json(&json!({ "message": message, "assistantId": "asst-1" }))
        .send()
        .await
        .expect("message request should send")
        .error_for_status()
        .expect("message request should succeed")
        .json()
        .await
        .expect("message response should decode")
}

fn titled_thread(thread_id: &str, created_at: &str, title: &str) -> Value {
    let mut thread = thread(thread_id, created_at, Some("asst-1"));
    thread["metadata"]["title"] = Value::String(title.to_string());
    thread
}

#[tokio::test]
async fn session_loads_assistant_and_conversations_once() {
    let agent = MockAgentServer::start(vec![
        titled_thread("t-1", "2026-10-17T08:00:00Z", "Weekly plan"),
        titled_thread("t-2", "2026-10-18T08:00:00Z", "Travel"),
    ])
    .await;
    let api = TestApiServer::start(&agent.base_url).await;
    let client = client_for(&api);

    let session = ChatSession::start(client.clone());
    let (assistant, conversations) = timeout(WAIT, session.ready()).await.expect("session loads");
    assert!(assistant.error.is_none());
    assert_eq!(session.assistant_id().as_deref(), Some("asst-1"));

    let conversations = conversations.data.expect("conversation list should load");
    let titles: Vec<String> = conversations.iter().map(conversation_title).collect();
    assert_eq!(titles, vec!["Travel".to_string(), "Weekly plan".to_string()]);

    let second_list = client.conversation_list();
    let state = timeout(WAIT, second_list.settled()).await.expect("list settles");
    assert!(Arc::ptr_eq(
        &state.data.expect("list should be cached"),
        &conversations
    ));
    assert_eq!(client.focus(), 0);
    assert_eq!(client.reconnect(), 0);
    assert_eq!(agent.search_count().await, 2);
}

#[tokio::test]
async fn thread_view_follows_new_messages_after_refresh() {
    let agent = MockAgentServer::start(vec![thread(
        "t-1",
        "2026-10-18T08:00:00Z",
        Some("asst-1"),
    )])
    .await;
    let api = TestApiServer::start(&agent.base_url).await;
    let client = client_for(&api);

    let view = client.thread_detail(Some("t-1"));
    let state = timeout(WAIT, view.settled()).await.expect("thread loads");
    let detail = state.data.expect("thread should load");
    assert!(thread_messages(&detail.thread).is_empty());

    let sent = post_message(&api, "t-1", "book a table").await;
    assert_eq!(sent.messages.len(), 2);

    assert_eq!(client.focus(), 1);
    let state = timeout(WAIT, view.settled()).await.expect("refresh settles");
    let messages = thread_messages(&state.data.expect("thread should stay loaded").thread);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "book a table");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, "echo: book a table");

    let reopened = client.thread_detail(Some("t-1"));
    timeout(WAIT, reopened.settled()).await.expect("remount settles");
    // mount, sent-message refetch in the proxy, focus, remount
    assert_eq!(agent.thread_reads("t-1").await, 4);
}

#[tokio::test]
async fn missing_assistant_surfaces_proxy_error() {
    let agent = MockAgentServer::start(Vec::new()).await;
    let api = TestApiServer::start(&agent.base_url).await;
    let client = client_for(&api);

    let session = ChatSession::start(client);
    let (assistant, conversations) = timeout(WAIT, session.ready()).await.expect("session loads");

    let error = assistant.error.expect("assistant lookup should fail");
    assert_eq!(error.status, Some(404));
    assert_eq!(error.details.as_deref(), Some("No threads found"));
    assert!(session.assistant_id().is_none());
    assert_eq!(conversations.data.map(|list| list.len()), Some(0));
}

#[tokio::test]
async fn unknown_thread_keeps_view_empty_with_error() {
    let agent = MockAgentServer::start(Vec::new()).await;
    let api = TestApiServer::start(&agent.base_url).await;
    let client = client_for(&api);

    let view = client.thread_detail(Some("missing"));
    let state = timeout(WAIT, view.settled()).await.expect("thread settles");

    assert!(state.data.is_none());
    assert!(!state.is_loading);
    let error = state.error.expect("missing thread should error");
    assert_eq!(error.status, Some(500));
    assert_eq!(error.message, "Failed to fetch thread details");
    assert!(!client.store().has_data(&ResourceKey::conversation("missing")));
}
