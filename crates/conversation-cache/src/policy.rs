use std::time::Duration;

/// What happens when a consumer mounts a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountRevalidation {
    /// Fetch on every mount, even when the key already holds data.
    Always,
    /// Fetch only when the key holds no data yet.
    IfEmpty,
}

/// Event that can cause a key to be fetched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Mount,
    Focus,
    Reconnect,
    Interval,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevalidationPolicy {
    pub revalidate_on_focus: bool,
    pub revalidate_on_reconnect: bool,
    pub on_mount: MountRevalidation,
    pub refresh_interval: Option<Duration>,
    /// Requests for a key issued within this window of a pending one join it
    /// instead of hitting the network. Zero disables deduplication.
    pub dedupe_interval: Duration,
    /// Keep showing the previous key's data while a newly selected key loads.
    pub keep_previous_data: bool,
}

impl RevalidationPolicy {
    /// Fetched once per cache lifetime; only explicit invalidation refetches.
    pub const STABLE: Self = Self {
        revalidate_on_focus: false,
        revalidate_on_reconnect: false,
        on_mount: MountRevalidation::IfEmpty,
        refresh_interval: None,
        dedupe_interval: Duration::from_secs(2),
        keep_previous_data: false,
    };

    /// Always refetched on focus, reconnect and mount, never deduplicated
    /// and never masked by another key's data.
    pub const LIVE: Self = Self {
        revalidate_on_focus: true,
        revalidate_on_reconnect: true,
        on_mount: MountRevalidation::Always,
        refresh_interval: None,
        dedupe_interval: Duration::ZERO,
        keep_previous_data: false,
    };

    pub fn revalidates_on(&self, trigger: Trigger, has_data: bool) -> bool {
        match trigger {
            Trigger::Mount => match self.on_mount {
                MountRevalidation::Always => true,
                MountRevalidation::IfEmpty => !has_data,
            },
            Trigger::Focus => self.revalidate_on_focus,
            Trigger::Reconnect => self.revalidate_on_reconnect,
            Trigger::Interval => self.refresh_interval.is_some(),
            Trigger::Manual => true,
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    pub fn with_keep_previous_data(mut self, keep: bool) -> Self {
        self.keep_previous_data = keep;
        self
    }
}

/// Per-resource policies of a [`crate::ConversationClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientPolicies {
    pub assistant: RevalidationPolicy,
    pub conversations: RevalidationPolicy,
    pub thread: RevalidationPolicy,
    pub chart: RevalidationPolicy,
}

impl Default for ClientPolicies {
    fn default() -> Self {
        Self {
            assistant: RevalidationPolicy::STABLE,
            conversations: RevalidationPolicy::STABLE,
            thread: RevalidationPolicy::LIVE,
            chart: RevalidationPolicy::LIVE,
        }
    }
}
