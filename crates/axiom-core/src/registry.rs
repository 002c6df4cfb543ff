use std::collections::{BTreeSet, HashSet};

use crate::models::{
    ContextKey, CoreError, CoreErrorKind, CoreResult, HttpMethod, TaskCategory, TaskDefinition,
};

const TASK_ENDPOINT: &str = "/api/tasks/execute";

const ALL_TASKS: [TaskDefinition; 8] = [
    TaskDefinition {
        id: "quick-advice",
        display_name: "Quick advice",
        description: "One high-impact insight on the latest entry",
        endpoint: TASK_ENDPOINT,
        method: HttpMethod::Post,
        action: "quick_advice",
        required_keys: &[
            ContextKey::LatestEntry,
            ContextKey::ConversationHistory,
            ContextKey::AgentStrategy,
        ],
        category: TaskCategory::Analysis,
        priority: 1,
    },
    TaskDefinition {
        id: "analyze",
        display_name: "Analyze entry",
        description: "Separate signal from noise in the selected entry",
        endpoint: TASK_ENDPOINT,
        method: HttpMethod::Post,
        action: "analyze",
        required_keys: &[ContextKey::SelectedEntry],
        category: TaskCategory::Analysis,
        priority: 2,
    },
    TaskDefinition {
        id: "summarize",
        display_name: "Summarize",
        description: "Summarize recent notes and conversation",
        endpoint: TASK_ENDPOINT,
        method: HttpMethod::Post,
        action: "summarize",
        required_keys: &[ContextKey::RecentEntries, ContextKey::ConversationHistory],
        category: TaskCategory::Reflection,
        priority: 3,
    },
    TaskDefinition {
        id: "decide-now",
        display_name: "Decide now",
        description: "Work through pending decisions",
        endpoint: TASK_ENDPOINT,
        method: HttpMethod::Post,
        action: "decide_now",
        required_keys: &[ContextKey::PendingDecisions, ContextKey::AgentStrategy],
        category: TaskCategory::Decision,
        priority: 4,
    },
    TaskDefinition {
        id: "extract-actions",
        display_name: "Extract actions",
        description: "List actionable items found in recent notes",
        endpoint: TASK_ENDPOINT,
        method: HttpMethod::Post,
        action: "extract_actions",
        required_keys: &[ContextKey::RecentEntries],
        category: TaskCategory::Planning,
        priority: 5,
    },
    TaskDefinition {
        id: "extract-tasks",
        display_name: "Extract tasks",
        description: "Turn recent notes into a task list",
        endpoint: TASK_ENDPOINT,
        method: HttpMethod::Post,
        action: "extract_actions",
        required_keys: &[ContextKey::RecentEntries],
        category: TaskCategory::Planning,
        priority: 6,
    },
    TaskDefinition {
        id: "find-contradictions",
        display_name: "Find contradictions",
        description: "Surface conflicting thoughts and decisions",
        endpoint: TASK_ENDPOINT,
        method: HttpMethod::Post,
        action: "find_contradictions",
        required_keys: &[ContextKey::UserPatterns, ContextKey::RecentEntries],
        category: TaskCategory::Reflection,
        priority: 7,
    },
    TaskDefinition {
        id: "daily-review",
        display_name: "Daily review",
        description: "Review today's progress and primary focus",
        endpoint: TASK_ENDPOINT,
        method: HttpMethod::Post,
        action: "daily_review",
        required_keys: &[ContextKey::TimeWindow, ContextKey::RecentEntries],
        category: TaskCategory::Reflection,
        priority: 8,
    },
];

pub fn tasks() -> &'static [TaskDefinition] {
    &ALL_TASKS
}

pub fn task(id: &str) -> Option<&'static TaskDefinition> {
    tasks().iter().find(|definition| definition.id == id)
}

#[derive(Clone, Debug)]
pub struct TaskRegistry {
    tasks: Vec<TaskDefinition>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TaskRegistry {
    pub fn builtin() -> Self {
        Self {
            tasks: tasks().to_vec(),
        }
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = TaskDefinition>) -> CoreResult<Self> {
        let mut seen = HashSet::new();
        let mut mapped = Vec::new();
        for definition in tasks {
            if !seen.insert(definition.id) {
                return Err(CoreError::new(
                    CoreErrorKind::InvalidInput,
                    format!("duplicate task registration for '{}'", definition.id),
                )
                .for_task(definition.id));
            }

            let mut keys = HashSet::new();
            if let Some(repeated) = definition
                .required_keys
                .iter()
                .find(|key| !keys.insert(**key))
            {
                return Err(CoreError::new(
                    CoreErrorKind::InvalidInput,
                    format!(
                        "task '{}' requires context key '{repeated}' more than once",
                        definition.id
                    ),
                )
                .for_task(definition.id));
            }

            mapped.push(definition);
        }

        Ok(Self { tasks: mapped })
    }

    pub fn task(&self, id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|definition| definition.id == id)
    }

    pub fn lookup(&self, id: &str) -> CoreResult<&TaskDefinition> {
        self.task(id).ok_or_else(|| CoreError::task_not_found(id))
    }

    /// Tasks ordered for display; equal priorities keep registration order.
    pub fn list(&self) -> Vec<&TaskDefinition> {
        let mut ordered: Vec<&TaskDefinition> = self.tasks.iter().collect();
        ordered.sort_by_key(|definition| definition.priority);
        ordered
    }

    pub fn categories(&self) -> BTreeSet<TaskCategory> {
        self.tasks
            .iter()
            .map(|definition| definition.category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
