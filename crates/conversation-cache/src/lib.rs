//! Client-side cache and revalidation for the conversation API.
//!
//! The assistant identity and the conversation list are fetched once per
//! session; thread details and chart data are refetched on every mount,
//! focus and reconnect. All consumers share one [`CacheStore`], injected into
//! the [`ConversationClient`]. Handles must be created inside a Tokio runtime.

mod client;
mod fetcher;
mod key;
mod policy;
mod session;
mod store;

pub use client::{ConversationClient, ResourceHandle, ResourceState};
pub use fetcher::{FetchError, FetchFuture, Fetcher, HttpFetcher};
pub use key::ResourceKey;
pub use policy::{ClientPolicies, MountRevalidation, RevalidationPolicy, Trigger};
pub use session::ChatSession;
pub use store::CacheStore;
