use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::models::ContextKey;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Analysis,
    Planning,
    Reflection,
    Decision,
}

impl TaskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::Analysis => "analysis",
            TaskCategory::Planning => "planning",
            TaskCategory::Reflection => "reflection",
            TaskCategory::Decision => "decision",
        }
    }
}

/// A remotely executed task and the context it needs before dispatch.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub endpoint: &'static str,
    pub method: HttpMethod,
    pub action: &'static str,
    pub required_keys: &'static [ContextKey],
    pub category: TaskCategory,
    pub priority: u32,
}

impl TaskDefinition {
    pub fn requires(&self, key: ContextKey) -> bool {
        self.required_keys.contains(&key)
    }
}
