use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::fetcher::FetchError;
use crate::key::{CachedValue, ResourceKey};
use crate::policy::RevalidationPolicy;

/// Process-wide cache shared by every consumer of one client session.
///
/// Entries are written only by the accessors' own revalidation and by
/// `mutate`; the store's write surface is private to this crate. Each entry
/// carries a generation counter and hands out increasing request sequence
/// numbers, so responses that lost their race are detected and dropped.
///
/// Entries holding data stay cached until `clear` or `invalidate`, so the
/// store grows with every resource a session has loaded. Entries with no
/// data, no consumer and no subscriber are evicted on unmount.
#[derive(Clone, Default)]
pub struct CacheStore {
    inner: Arc<Mutex<StoreState>>,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<ResourceKey, CacheEntry>,
    next_request_seq: u64,
    session: u64,
}

struct CacheEntry {
    data: Option<CachedValue>,
    error: Option<FetchError>,
    generation: u64,
    pending: BTreeMap<u64, Instant>,
    last_applied_seq: u64,
    mounts: usize,
    policy: Option<RevalidationPolicy>,
    updates: watch::Sender<u64>,
}

impl CacheEntry {
    fn new() -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            data: None,
            error: None,
            generation: 0,
            pending: BTreeMap::new(),
            last_applied_seq: 0,
            mounts: 0,
            policy: None,
            updates,
        }
    }

    fn notify(&self) {
        self.updates.send_modify(|version| *version = version.wrapping_add(1));
    }

    fn is_idle(&self) -> bool {
        self.mounts == 0
            && self.data.is_none()
            && self.pending.is_empty()
            && self.updates.receiver_count() == 0
    }

    fn reset(&mut self) {
        self.data = None;
        self.error = None;
        self.generation = self.generation.wrapping_add(1);
        self.pending.clear();
    }
}

/// Identifies one issued request: the key, its position in issue order and
/// the cache generation it was issued against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestToken {
    pub(crate) key: ResourceKey,
    pub(crate) seq: u64,
    pub(crate) generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BeginRequest {
    Issued(RequestToken),
    Deduplicated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    Applied,
    Discarded,
}

#[derive(Clone, Default)]
pub(crate) struct EntrySnapshot {
    pub(crate) data: Option<CachedValue>,
    pub(crate) error: Option<FetchError>,
    pub(crate) is_validating: bool,
}

impl CacheStore {
    /// Starts a cache session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ends the current session: drops every cached value and discards all
    /// in-flight responses. Mounted consumers stay mounted.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.session = state.session.wrapping_add(1);
        for entry in state.entries.values_mut() {
            entry.reset();
            entry.notify();
        }
    }

    pub fn session_generation(&self) -> u64 {
        self.lock().session
    }

    pub fn generation(&self, key: &ResourceKey) -> u64 {
        self.lock()
            .entries
            .get(key)
            .map(|entry| entry.generation)
            .unwrap_or_default()
    }

    pub fn has_data(&self, key: &ResourceKey) -> bool {
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.data.is_some())
    }

    pub fn is_mounted(&self, key: &ResourceKey) -> bool {
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.mounts > 0)
    }

    /// Change notifications for `key`, including for discarded responses.
    pub fn subscribe(&self, key: &ResourceKey) -> watch::Receiver<u64> {
        self.lock()
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::new)
            .updates
            .subscribe()
    }

    pub(crate) fn snapshot(&self, key: &ResourceKey) -> EntrySnapshot {
        self.lock()
            .entries
            .get(key)
            .map(|entry| EntrySnapshot {
                data: entry.data.clone(),
                error: entry.error.clone(),
                is_validating: !entry.pending.is_empty(),
            })
            .unwrap_or_default()
    }

    /// Registers a consumer of `key`. Returns whether the key already held data.
    pub(crate) fn mount(&self, key: &ResourceKey, policy: RevalidationPolicy) -> bool {
        let mut state = self.lock();
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::new);
        entry.mounts += 1;
        entry.policy = Some(policy);
        entry.data.is_some()
    }

    /// Drops a consumer of `key`. When it was the last one, every in-flight
    /// request for the key is cancelled and its late result will be ignored.
    /// An entry left with nothing worth keeping is evicted.
    pub(crate) fn unmount(&self, key: &ResourceKey) -> usize {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(key) else {
            return 0;
        };

        entry.mounts = entry.mounts.saturating_sub(1);
        let mut cancelled = 0;
        if entry.mounts == 0 && !entry.pending.is_empty() {
            cancelled = entry.pending.len();
            entry.pending.clear();
            entry.notify();
        }

        if entry.is_idle() {
            state.entries.remove(key);
        }

        cancelled
    }

    pub(crate) fn mounted_policy(&self, key: &ResourceKey) -> Option<RevalidationPolicy> {
        self.lock()
            .entries
            .get(key)
            .filter(|entry| entry.mounts > 0)
            .and_then(|entry| entry.policy)
    }

    pub(crate) fn mounted(&self) -> Vec<(ResourceKey, RevalidationPolicy, bool)> {
        self.lock()
            .entries
            .iter()
            .filter(|(_, entry)| entry.mounts > 0)
            .filter_map(|(key, entry)| {
                entry
                    .policy
                    .map(|policy| (key.clone(), policy, entry.data.is_some()))
            })
            .collect()
    }

    pub(crate) fn begin_request(
        &self,
        key: &ResourceKey,
        dedupe_interval: Duration,
        now: Instant,
    ) -> BeginRequest {
        let mut state = self.lock();
        state.next_request_seq += 1;
        let seq = state.next_request_seq;

        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::new);

        if !dedupe_interval.is_zero()
            && entry
                .pending
                .values()
                .any(|started_at| now.saturating_duration_since(*started_at) < dedupe_interval)
        {
            return BeginRequest::Deduplicated;
        }

        entry.pending.insert(seq, now);
        entry.notify();

        BeginRequest::Issued(RequestToken {
            key: key.clone(),
            seq,
            generation: entry.generation,
        })
    }

    /// Applies a response if it is still wanted: it must not have been
    /// cancelled, its generation must be current, and no response issued
    /// after it may have been applied already.
    pub(crate) fn complete(
        &self,
        token: &RequestToken,
        result: Result<CachedValue, FetchError>,
    ) -> Completion {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(&token.key) else {
            return Completion::Discarded;
        };

        let was_pending = entry.pending.remove(&token.seq).is_some();
        let superseded = token.seq <= entry.last_applied_seq;
        if !was_pending || token.generation != entry.generation || superseded {
            entry.notify();
            return Completion::Discarded;
        }

        entry.last_applied_seq = token.seq;
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
            }
            Err(err) => entry.error = Some(err),
        }
        entry.notify();

        Completion::Applied
    }

    /// Starts a new generation for `key`, discarding whatever is in flight.
    /// `Some` replaces the cached value; `None` keeps it.
    pub(crate) fn mutate(&self, key: &ResourceKey, data: Option<CachedValue>) -> u64 {
        let mut state = self.lock();
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::new);

        entry.generation = entry.generation.wrapping_add(1);
        entry.pending.clear();
        if let Some(data) = data {
            entry.data = Some(data);
            entry.error = None;
        }
        entry.notify();

        entry.generation
    }

    pub(crate) fn invalidate(&self, key: &ResourceKey) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(key) {
            entry.reset();
            entry.notify();
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
