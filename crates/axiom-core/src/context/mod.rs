pub mod fetch;
pub mod resolver;

pub use fetch::{HttpContextFetcher, TimeWindowFetcher, default_strategies};
pub use resolver::{ContextCacheEntry, ContextResolver, ResolvedContext};

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, SystemTime};

use serde_json::Value;

use crate::models::{ContextKey, CoreResult};

pub const DEFAULT_CONTEXT_TTL: Duration = Duration::from_secs(60);

const CONTEXT_TTLS: &[(ContextKey, Duration)] = &[
    (ContextKey::LatestEntry, Duration::from_secs(30)),
    (ContextKey::SelectedEntry, Duration::from_secs(30)),
    (ContextKey::ConversationHistory, Duration::from_secs(60)),
    (ContextKey::AgentStrategy, Duration::from_secs(5 * 60)),
    (ContextKey::PendingDecisions, Duration::from_secs(2 * 60)),
    (ContextKey::UserPatterns, Duration::from_secs(10 * 60)),
];

/// TTL from the static table, or `DEFAULT_CONTEXT_TTL` for unmapped keys.
pub fn ttl_for(key: ContextKey) -> Duration {
    CONTEXT_TTLS
        .iter()
        .find(|(mapped, _)| *mapped == key)
        .map(|(_, ttl)| *ttl)
        .unwrap_or(DEFAULT_CONTEXT_TTL)
}

pub type ContextFetchFuture = Pin<Box<dyn Future<Output = CoreResult<Value>> + Send>>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContextFetchRequest {
    pub user_id: String,
    pub key: ContextKey,
    pub requested_at: SystemTime,
}

pub trait ContextFetcher: Send + Sync {
    fn fetch(&self, request: ContextFetchRequest) -> ContextFetchFuture;
}
