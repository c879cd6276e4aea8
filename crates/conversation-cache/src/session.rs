use shared::models::{AgentThread, AssistantIdentity, ThreadDetail};

use crate::client::{ConversationClient, ResourceHandle, ResourceState};

/// Session-wide state of a chat client: the assistant identity and the
/// conversation list stay mounted for the session's lifetime while thread
/// views come and go.
pub struct ChatSession {
    client: ConversationClient,
    assistant: ResourceHandle<AssistantIdentity>,
    conversations: ResourceHandle<Vec<AgentThread>>,
}

impl ChatSession {
    pub fn start(client: ConversationClient) -> Self {
        let assistant = client.assistant_identity();
        let conversations = client.conversation_list();

        Self {
            client,
            assistant,
            conversations,
        }
    }

    pub fn client(&self) -> &ConversationClient {
        &self.client
    }

    pub fn assistant(&self) -> ResourceState<AssistantIdentity> {
        self.assistant.state()
    }

    pub fn conversations(&self) -> ResourceState<Vec<AgentThread>> {
        self.conversations.state()
    }

    /// The assistant to run new messages against, once it is known.
    pub fn assistant_id(&self) -> Option<String> {
        self.assistant
            .state()
            .data
            .map(|identity| identity.assistant_id.clone())
    }

    pub async fn ready(
        &self,
    ) -> (
        ResourceState<AssistantIdentity>,
        ResourceState<Vec<AgentThread>>,
    ) {
        let assistant = self.assistant.settled().await;
        let conversations = self.conversations.settled().await;
        (assistant, conversations)
    }

    pub fn open_thread(&self, thread_id: Option<&str>) -> ResourceHandle<ThreadDetail> {
        self.client.thread_detail(thread_id)
    }

    /// Unmounts the session resources and clears the cache.
    pub fn end(self) {
        let store = self.client.store().clone();
        drop(self);
        store.clear();
    }
}
