use std::sync::Arc;

use serde_json::{Value, json};

use crate::clock::epoch_millis;
use crate::config::DispatcherConfig;
use crate::context::{ContextFetchFuture, ContextFetchRequest, ContextFetcher};
use crate::execution::{HttpRequest, HttpTransport, send_validated};
use crate::models::ContextKey;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// `GET <url>?userId=<user>`; the decoded body is the context value.
pub struct HttpContextFetcher {
    transport: Arc<dyn HttpTransport>,
    url: String,
}

impl HttpContextFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ContextFetcher for HttpContextFetcher {
    fn fetch(&self, request: ContextFetchRequest) -> ContextFetchFuture {
        let http = HttpRequest::get(self.url.clone()).query("userId", request.user_id);
        let pending = send_validated(self.transport.as_ref(), http);
        Box::pin(async move { pending.await?.into_json() })
    }
}

/// Computes the current UTC day window locally.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeWindowFetcher;

impl TimeWindowFetcher {
    pub fn window_at(now_ms: u64) -> Value {
        json!({
            "label": "today",
            "start": now_ms - now_ms % DAY_MS,
            "end": now_ms,
        })
    }
}

impl ContextFetcher for TimeWindowFetcher {
    fn fetch(&self, request: ContextFetchRequest) -> ContextFetchFuture {
        let window = Self::window_at(epoch_millis(request.requested_at));
        Box::pin(async move { Ok(window) })
    }
}

fn endpoint_path(key: ContextKey) -> Option<&'static str> {
    match key {
        ContextKey::LatestEntry => Some("/api/memory/latest"),
        ContextKey::RecentEntries => Some("/api/memory/recent"),
        ContextKey::ConversationHistory => Some("/api/conversation/history"),
        ContextKey::AgentStrategy => Some("/api/agent/strategy"),
        ContextKey::PendingDecisions => Some("/api/decisions/pending"),
        ContextKey::UserPatterns => Some("/api/patterns"),
        ContextKey::SelectedEntry | ContextKey::TimeWindow => None,
    }
}

/// The built-in strategy table. `selectedEntry` has no strategy: callers
/// supply it through overrides.
pub fn default_strategies(
    config: &DispatcherConfig,
    transport: Arc<dyn HttpTransport>,
) -> Vec<(ContextKey, Arc<dyn ContextFetcher>)> {
    let mut strategies: Vec<(ContextKey, Arc<dyn ContextFetcher>)> = ContextKey::ALL
        .into_iter()
        .filter_map(|key| {
            let path = endpoint_path(key)?;
            let fetcher: Arc<dyn ContextFetcher> = Arc::new(HttpContextFetcher::new(
                transport.clone(),
                config.endpoint_url(path),
            ));
            Some((key, fetcher))
        })
        .collect();
    strategies.push((ContextKey::TimeWindow, Arc::new(TimeWindowFetcher)));
    strategies
}
