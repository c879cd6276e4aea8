use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use shared::config::ClientConfig;
use shared::models::{AgentThread, ArtifactInfo, AssistantIdentity, ChartData, ThreadDetail};
use shared::thread::chart_type;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::fetcher::{FetchError, Fetcher, HttpFetcher};
use crate::key::{CachedValue, ResourceKey};
use crate::policy::{ClientPolicies, RevalidationPolicy, Trigger};
use crate::store::{BeginRequest, CacheStore, Completion};

/// Read access to the conversation API through a shared [`CacheStore`].
#[derive(Clone)]
pub struct ConversationClient {
    store: CacheStore,
    fetcher: Arc<dyn Fetcher>,
    policies: ClientPolicies,
}

impl ConversationClient {
    pub fn new(store: CacheStore, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store,
            fetcher,
            policies: ClientPolicies::default(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self::new(CacheStore::new(), Arc::new(fetcher)))
    }

    pub fn with_policies(mut self, policies: ClientPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn policies(&self) -> &ClientPolicies {
        &self.policies
    }

    pub fn assistant_identity(&self) -> ResourceHandle<AssistantIdentity> {
        ResourceHandle::mount(
            self.clone(),
            Some(ResourceKey::Assistant),
            self.policies.assistant,
        )
    }

    pub fn conversation_list(&self) -> ResourceHandle<Vec<AgentThread>> {
        ResourceHandle::mount(
            self.clone(),
            Some(ResourceKey::Conversations),
            self.policies.conversations,
        )
    }

    /// `None` or a blank id yields a disabled handle: no request, no cache
    /// entry.
    pub fn thread_detail(&self, thread_id: Option<&str>) -> ResourceHandle<ThreadDetail> {
        ResourceHandle::mount(self.clone(), thread_key(thread_id), self.policies.thread)
    }

    /// Series behind a chart artifact. Disabled when there is no artifact or
    /// its chart type cannot be resolved.
    pub fn chart(&self, artifact: Option<&ArtifactInfo>) -> ResourceHandle<ChartData> {
        let key = artifact.and_then(|artifact| {
            let chart_type = chart_type(artifact)?;
            Some(ResourceKey::chart(artifact.id.as_str(), chart_type))
        });
        ResourceHandle::mount(self.clone(), key, self.policies.chart)
    }

    /// Window regained focus. Returns how many requests were issued.
    pub fn focus(&self) -> usize {
        self.revalidate_mounted(Trigger::Focus)
    }

    /// Network connectivity came back. Returns how many requests were issued.
    pub fn reconnect(&self) -> usize {
        self.revalidate_mounted(Trigger::Reconnect)
    }

    /// Drops the cached value for `key` and refetches it if anyone is
    /// still mounted on it.
    pub fn invalidate(&self, key: &ResourceKey) {
        self.store.invalidate(key);
        if let Some(policy) = self.store.mounted_policy(key) {
            self.revalidate(key.clone(), Trigger::Manual, &policy);
        }
    }

    fn revalidate_mounted(&self, trigger: Trigger) -> usize {
        let mut issued = 0;
        for (key, policy, has_data) in self.store.mounted() {
            if policy.revalidates_on(trigger, has_data) && self.revalidate(key, trigger, &policy) {
                issued += 1;
            }
        }
        issued
    }

    /// Issues one request for `key` unless it is deduplicated. The response
    /// is applied from a spawned task.
    fn revalidate(&self, key: ResourceKey, trigger: Trigger, policy: &RevalidationPolicy) -> bool {
        let token = match self
            .store
            .begin_request(&key, policy.dedupe_interval, Instant::now())
        {
            BeginRequest::Issued(token) => token,
            BeginRequest::Deduplicated => {
                debug!(key = %key, ?trigger, "joined pending request");
                return false;
            }
        };

        debug!(key = %key, seq = token.seq, ?trigger, "revalidating");
        let store = self.store.clone();
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(async move {
            let result = match fetcher.fetch(&token.key).await {
                Ok(value) => token
                    .key
                    .decode(value)
                    .map_err(|err| FetchError::undecodable(&token.key, &err)),
                Err(err) => Err(err),
            };

            if let Err(err) = &result {
                warn!(key = %token.key, status = ?err.status, "fetch failed: {err}");
            }

            match store.complete(&token, result) {
                Completion::Applied => debug!(key = %token.key, seq = token.seq, "applied"),
                Completion::Discarded => {
                    debug!(key = %token.key, seq = token.seq, "discarded stale response")
                }
            }
        });

        true
    }
}

/// Snapshot of one resource as seen by a consumer.
pub struct ResourceState<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<FetchError>,
    /// No data yet and a request is in flight.
    pub is_loading: bool,
    /// Any request for the key is in flight.
    pub is_validating: bool,
}

impl<T> ResourceState<T> {
    fn disabled() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_validating: false,
        }
    }
}

impl<T> Clone for ResourceState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_loading: self.is_loading,
            is_validating: self.is_validating,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ResourceState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceState")
            .field("data", &self.data)
            .field("error", &self.error)
            .field("is_loading", &self.is_loading)
            .field("is_validating", &self.is_validating)
            .finish()
    }
}

/// A mounted consumer of one key. Mounting may trigger a fetch according to
/// the key's policy; dropping the handle unmounts it.
pub struct ResourceHandle<T> {
    client: ConversationClient,
    key: Option<ResourceKey>,
    policy: RevalidationPolicy,
    previous: Option<Arc<T>>,
    refresh_task: Option<JoinHandle<()>>,
}

impl<T: Any + Send + Sync> ResourceHandle<T> {
    fn mount(
        client: ConversationClient,
        key: Option<ResourceKey>,
        policy: RevalidationPolicy,
    ) -> Self {
        let mut handle = Self {
            client,
            key: None,
            policy,
            previous: None,
            refresh_task: None,
        };
        handle.attach(key);
        handle
    }

    pub fn key(&self) -> Option<&ResourceKey> {
        self.key.as_ref()
    }

    pub fn policy(&self) -> &RevalidationPolicy {
        &self.policy
    }

    pub fn state(&self) -> ResourceState<T> {
        let Some(key) = &self.key else {
            return ResourceState::disabled();
        };

        let snapshot = self.client.store.snapshot(key);
        let mut data = snapshot.data.and_then(|data| data.downcast::<T>().ok());
        let is_loading = data.is_none() && snapshot.is_validating;
        if data.is_none() && self.policy.keep_previous_data {
            data = self.previous.clone();
        }

        ResourceState {
            data,
            error: snapshot.error,
            is_loading,
            is_validating: snapshot.is_validating,
        }
    }

    /// Waits until no request for the key is in flight.
    pub async fn settled(&self) -> ResourceState<T> {
        let Some(mut updates) = self.subscribe() else {
            return self.state();
        };

        loop {
            let state = self.state();
            if !state.is_validating {
                return state;
            }
            if updates.changed().await.is_err() {
                return self.state();
            }
        }
    }

    /// Change notifications for the key; `None` while disabled.
    pub fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        self.key.as_ref().map(|key| self.client.store.subscribe(key))
    }

    /// `Some` overwrites the cached value for every consumer of the key;
    /// `None` forces a refetch. Either way, responses already in flight are
    /// discarded.
    pub fn mutate(&self, value: Option<T>) {
        let Some(key) = &self.key else {
            return;
        };

        match value {
            Some(value) => {
                let data: CachedValue = Arc::new(value);
                let generation = self.client.store.mutate(key, Some(data));
                debug!(key = %key, generation, "cache overwritten");
            }
            None => {
                let generation = self.client.store.mutate(key, None);
                debug!(key = %key, generation, "cache refresh forced");
                self.client.revalidate(key.clone(), Trigger::Manual, &self.policy);
            }
        }
    }

    /// Fetches the key now. Returns false when disabled or deduplicated.
    pub fn revalidate(&self) -> bool {
        match &self.key {
            Some(key) => self.client.revalidate(key.clone(), Trigger::Manual, &self.policy),
            None => false,
        }
    }

    fn set_key(&mut self, key: Option<ResourceKey>) {
        if self.key == key {
            return;
        }

        self.previous = if self.policy.keep_previous_data {
            self.state().data
        } else {
            None
        };
        self.detach();
        self.attach(key);
    }

    fn attach(&mut self, key: Option<ResourceKey>) {
        let Some(key) = key else {
            self.key = None;
            return;
        };

        let has_data = self.client.store.mount(&key, self.policy);
        if self.policy.revalidates_on(Trigger::Mount, has_data) {
            self.client.revalidate(key.clone(), Trigger::Mount, &self.policy);
        }

        if let Some(period) = self.policy.refresh_interval {
            let client = self.client.clone();
            let policy = self.policy;
            let key = key.clone();
            self.refresh_task = Some(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    client.revalidate(key.clone(), Trigger::Interval, &policy);
                }
            }));
        }

        self.key = Some(key);
    }

    fn detach(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }

        if let Some(key) = self.key.take() {
            let cancelled = self.client.store.unmount(&key);
            if cancelled > 0 {
                debug!(key = %key, cancelled, "cancelled in-flight requests");
            }
        }
    }
}

impl ResourceHandle<ThreadDetail> {
    /// Points the handle at another thread, or disables it with `None` or a
    /// blank id. The previous thread's in-flight responses are ignored once
    /// no one else is mounted on it.
    pub fn set_thread_id(&mut self, thread_id: Option<&str>) {
        self.set_key(thread_key(thread_id));
    }
}

fn thread_key(thread_id: Option<&str>) -> Option<ResourceKey> {
    thread_id
        .filter(|thread_id| !thread_id.trim().is_empty())
        .map(ResourceKey::conversation)
}

impl<T> Drop for ResourceHandle<T> {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        if let Some(key) = self.key.take() {
            self.client.store.unmount(&key);
        }
    }
}
