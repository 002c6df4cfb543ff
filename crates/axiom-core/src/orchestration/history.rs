use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::{ExecutionRecord, ExecutionSummary};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Bounded per-user log of dispatch outcomes, oldest evicted first.
pub struct ExecutionHistory {
    capacity: usize,
    records: Mutex<HashMap<String, VecDeque<ExecutionRecord>>>,
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, user_id: &str, entry: ExecutionRecord) {
        let mut records = self.lock_records();
        let log = records
            .entry(user_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));

        while log.len() >= self.capacity {
            log.pop_front();
        }
        log.push_back(entry);
    }

    /// Most recent first, at most `limit` entries.
    pub fn list(&self, user_id: &str, limit: usize) -> Vec<ExecutionRecord> {
        self.lock_records()
            .get(user_id)
            .map(|log| log.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, user_id: &str) -> usize {
        self.lock_records().get(user_id).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, user_id: &str) -> bool {
        self.len(user_id) == 0
    }

    pub fn clear(&self, user_id: &str) {
        self.lock_records().remove(user_id);
    }

    pub fn summary(&self, user_id: &str) -> ExecutionSummary {
        let records = self.lock_records();
        let Some(log) = records.get(user_id).filter(|log| !log.is_empty()) else {
            return ExecutionSummary::default();
        };

        let succeeded = log.iter().filter(|record| record.success).count();
        let total_duration: u64 = log.iter().map(|record| record.duration_ms).sum();

        ExecutionSummary {
            total: log.len(),
            succeeded,
            failed: log.len() - succeeded,
            average_duration_ms: total_duration / log.len() as u64,
        }
    }

    fn lock_records(&self) -> MutexGuard<'_, HashMap<String, VecDeque<ExecutionRecord>>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
