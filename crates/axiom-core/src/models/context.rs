use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Context as it travels in a dispatch payload, keyed by wire name.
pub type ContextMap = serde_json::Map<String, serde_json::Value>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextKey {
    LatestEntry,
    SelectedEntry,
    RecentEntries,
    ConversationHistory,
    AgentStrategy,
    PendingDecisions,
    UserPatterns,
    TimeWindow,
}

impl ContextKey {
    pub const ALL: [ContextKey; 8] = [
        ContextKey::LatestEntry,
        ContextKey::SelectedEntry,
        ContextKey::RecentEntries,
        ContextKey::ConversationHistory,
        ContextKey::AgentStrategy,
        ContextKey::PendingDecisions,
        ContextKey::UserPatterns,
        ContextKey::TimeWindow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContextKey::LatestEntry => "latestEntry",
            ContextKey::SelectedEntry => "selectedEntry",
            ContextKey::RecentEntries => "recentEntries",
            ContextKey::ConversationHistory => "conversationHistory",
            ContextKey::AgentStrategy => "agentStrategy",
            ContextKey::PendingDecisions => "pendingDecisions",
            ContextKey::UserPatterns => "userPatterns",
            ContextKey::TimeWindow => "timeWindow",
        }
    }
}

impl Display for ContextKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextKey {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ContextKey::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or(())
    }
}
