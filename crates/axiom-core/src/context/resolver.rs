use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::OnceCell;
use tokio::time::timeout;

use crate::clock::{Clock, SystemClock};
use crate::config::{DEFAULT_CONTEXT_FETCH_TIMEOUT, DispatcherConfig};
use crate::context::{ContextFetchRequest, ContextFetcher, default_strategies, ttl_for};
use crate::execution::HttpTransport;
use crate::models::ContextKey;

pub type ResolvedContext = BTreeMap<ContextKey, Value>;

type InFlight = Arc<OnceCell<Value>>;

#[derive(Clone, Debug, PartialEq)]
pub struct ContextCacheEntry {
    pub value: Value,
    pub fetched_at: SystemTime,
    pub ttl: Duration,
}

impl ContextCacheEntry {
    pub fn is_fresh(&self, now: SystemTime) -> bool {
        match now.duration_since(self.fetched_at) {
            Ok(elapsed) => elapsed < self.ttl,
            // Clock moved backwards; the entry cannot have aged.
            Err(_) => true,
        }
    }
}

/// Per-user, per-key cache of context values.
///
/// Each key resolves independently: a fresh entry is served from cache, a
/// missing or stale one is fetched through the key's strategy. Concurrent
/// lookups of the same (user, key) share one in-flight fetch. A failed fetch
/// resolves to `null` and is not cached.
pub struct ContextResolver {
    strategies: HashMap<ContextKey, Arc<dyn ContextFetcher>>,
    ttl_overrides: HashMap<ContextKey, Duration>,
    fetch_timeout: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<HashMap<String, UserContextState>>,
}

#[derive(Default)]
struct UserContextState {
    entries: HashMap<ContextKey, ContextCacheEntry>,
    in_flight: HashMap<ContextKey, InFlight>,
}

enum Lookup {
    Fresh(Value),
    Pending(InFlight),
}

impl ContextResolver {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            strategies: HashMap::new(),
            ttl_overrides: HashMap::new(),
            fetch_timeout: DEFAULT_CONTEXT_FETCH_TIMEOUT,
            clock,
            state: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_default_strategies(
        config: &DispatcherConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        default_strategies(config, transport).into_iter().fold(
            Self::new(clock).with_fetch_timeout(config.context_fetch_timeout),
            |resolver, (key, fetcher)| resolver.with_strategy(key, fetcher),
        )
    }

    pub fn with_strategy(mut self, key: ContextKey, fetcher: Arc<dyn ContextFetcher>) -> Self {
        self.strategies.insert(key, fetcher);
        self
    }

    pub fn with_ttl(mut self, key: ContextKey, ttl: Duration) -> Self {
        self.ttl_overrides.insert(key, ttl);
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn ttl(&self, key: ContextKey) -> Duration {
        self.ttl_overrides
            .get(&key)
            .copied()
            .unwrap_or_else(|| ttl_for(key))
    }

    pub fn has_strategy(&self, key: ContextKey) -> bool {
        self.strategies.contains_key(&key)
    }

    pub async fn resolve(&self, user_id: &str, keys: &[ContextKey]) -> ResolvedContext {
        let values = join_all(keys.iter().map(|key| self.resolve_key(user_id, *key))).await;
        keys.iter().copied().zip(values).collect()
    }

    pub async fn resolve_key(&self, user_id: &str, key: ContextKey) -> Value {
        let slot = match self.lookup(user_id, key) {
            Lookup::Fresh(value) => return value,
            Lookup::Pending(slot) => slot,
        };

        let owner = slot.clone();
        slot.get_or_init(|| self.fetch_and_store(user_id, key, owner))
            .await
            .clone()
    }

    pub fn cached_entry(&self, user_id: &str, key: ContextKey) -> Option<ContextCacheEntry> {
        self.lock_state()
            .get(user_id)
            .and_then(|user| user.entries.get(&key))
            .cloned()
    }

    pub fn invalidate(&self, user_id: &str, key: ContextKey) -> bool {
        self.lock_state()
            .get_mut(user_id)
            .is_some_and(|user| user.entries.remove(&key).is_some())
    }

    pub fn clear_user(&self, user_id: &str) {
        if let Some(user) = self.lock_state().get_mut(user_id) {
            user.entries.clear();
        }
    }

    fn lookup(&self, user_id: &str, key: ContextKey) -> Lookup {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let user = state.entry(user_id.to_string()).or_default();

        if let Some(entry) = user.entries.get(&key)
            && entry.is_fresh(now)
        {
            tracing::trace!(user_id, key = %key, "context cache hit");
            return Lookup::Fresh(entry.value.clone());
        }

        Lookup::Pending(
            user.in_flight
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone(),
        )
    }

    async fn fetch_and_store(&self, user_id: &str, key: ContextKey, slot: InFlight) -> Value {
        let fetched = self.fetch(user_id, key).await;

        let mut state = self.lock_state();
        let user = state.entry(user_id.to_string()).or_default();
        if user
            .in_flight
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, &slot))
        {
            user.in_flight.remove(&key);
        }

        match fetched {
            Some(value) => {
                user.entries.insert(
                    key,
                    ContextCacheEntry {
                        value: value.clone(),
                        fetched_at: self.clock.now(),
                        ttl: self.ttl(key),
                    },
                );
                value
            }
            None => Value::Null,
        }
    }

    async fn fetch(&self, user_id: &str, key: ContextKey) -> Option<Value> {
        let Some(fetcher) = self.strategies.get(&key) else {
            tracing::debug!(user_id, key = %key, "no fetch strategy for context key");
            return None;
        };

        let request = ContextFetchRequest {
            user_id: user_id.to_string(),
            key,
            requested_at: self.clock.now(),
        };

        match timeout(self.fetch_timeout, fetcher.fetch(request)).await {
            Ok(Ok(value)) => {
                tracing::debug!(user_id, key = %key, "context fetched");
                Some(value)
            }
            Ok(Err(error)) => {
                tracing::warn!(
                    user_id,
                    key = %key,
                    kind = ?error.kind,
                    status = ?error.status,
                    message = %error.message,
                    "context fetch failed; resolving to null"
                );
                None
            }
            Err(_) => {
                tracing::warn!(
                    user_id,
                    key = %key,
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "context fetch timed out; resolving to null"
                );
                None
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, HashMap<String, UserContextState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ContextResolver {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}
