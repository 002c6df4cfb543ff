use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::SystemTime;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub task_id: String,
    pub user_id: String,
    pub success: bool,
    pub duration_ms: u64,
    pub timestamp: SystemTime,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn succeeded(
        task_id: impl Into<String>,
        user_id: impl Into<String>,
        duration_ms: u64,
        timestamp: SystemTime,
        result: Value,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            user_id: user_id.into(),
            success: true,
            duration_ms,
            timestamp,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(
        task_id: impl Into<String>,
        user_id: impl Into<String>,
        duration_ms: u64,
        timestamp: SystemTime,
        error: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            user_id: user_id.into(),
            success: false,
            duration_ms,
            timestamp,
            result: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub average_duration_ms: u64,
}
