use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tokio::time::timeout;

use crate::clock::{Clock, SystemClock, epoch_millis};
use crate::config::DispatcherConfig;
use crate::context::ContextResolver;
use crate::execution::{HttpRequest, HttpTransport, UreqTransport, send_validated};
use crate::models::{
    ContextKey, ContextMap, CoreError, CoreErrorKind, CoreResult, ExecutionRecord, TaskDefinition,
};
use crate::orchestration::{DispatchCancellationToken, ExecutionHistory};
use crate::registry::TaskRegistry;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub task_id: String,
    pub action: String,
    pub user_id: String,
    pub context: ContextMap,
    pub timestamp: u64,
}

/// Looks up a task, fills its context, dispatches it and records the outcome.
#[derive(Clone)]
pub struct TaskDispatcher {
    config: DispatcherConfig,
    registry: Arc<TaskRegistry>,
    resolver: Arc<ContextResolver>,
    history: Arc<ExecutionHistory>,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
}

impl TaskDispatcher {
    /// Built-in catalog and context strategies over a `ureq` transport.
    pub fn new(config: DispatcherConfig) -> CoreResult<Self> {
        let transport: Arc<dyn HttpTransport> =
            Arc::new(UreqTransport::new(config.dispatch_timeout));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(
        config: DispatcherConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> CoreResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let resolver =
            ContextResolver::with_default_strategies(&config, transport.clone(), clock.clone());
        let history = ExecutionHistory::with_capacity(config.history_capacity);

        Self::with_components(
            config,
            Arc::new(TaskRegistry::builtin()),
            Arc::new(resolver),
            Arc::new(history),
            transport,
            clock,
        )
    }

    pub fn with_components(
        config: DispatcherConfig,
        registry: Arc<TaskRegistry>,
        resolver: Arc<ContextResolver>,
        history: Arc<ExecutionHistory>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> CoreResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            registry,
            resolver,
            history,
            transport,
            clock,
        })
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &ContextResolver {
        &self.resolver
    }

    pub fn execution_history(&self) -> &ExecutionHistory {
        &self.history
    }

    pub fn history(&self, user_id: &str, limit: usize) -> Vec<ExecutionRecord> {
        self.history.list(user_id, limit)
    }

    pub async fn execute(
        &self,
        task_id: &str,
        user_id: &str,
        overrides: ContextMap,
    ) -> CoreResult<Value> {
        self.execute_inner(task_id, user_id, overrides, None).await
    }

    /// Like `execute`, but stops waiting once `token` is cancelled. A cancelled
    /// dispatch is recorded as a failure.
    pub async fn execute_with_cancellation(
        &self,
        task_id: &str,
        user_id: &str,
        overrides: ContextMap,
        token: &DispatchCancellationToken,
    ) -> CoreResult<Value> {
        self.execute_inner(task_id, user_id, overrides, Some(token))
            .await
    }

    async fn execute_inner(
        &self,
        task_id: &str,
        user_id: &str,
        overrides: ContextMap,
        token: Option<&DispatchCancellationToken>,
    ) -> CoreResult<Value> {
        let task = self.registry.lookup(task_id).map_err(|error| {
            tracing::warn!(task_id, user_id, "rejected dispatch of unknown task");
            error.for_user(user_id)
        })?;

        let started = Instant::now();
        let outcome = match token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(CoreError::new(
                    CoreErrorKind::Cancelled,
                    format!("dispatch of task '{}' was cancelled", task.id),
                )),
                outcome = self.run(task, user_id, overrides) => outcome,
            },
            None => self.run(task, user_id, overrides).await,
        }
        .map_err(|error| error.for_task(task.id).for_user(user_id));

        self.record(task, user_id, started, &outcome);
        outcome
    }

    async fn run(
        &self,
        task: &TaskDefinition,
        user_id: &str,
        overrides: ContextMap,
    ) -> CoreResult<Value> {
        let context = self.build_context(task, user_id, overrides).await;
        let payload = TaskPayload {
            task_id: task.id.to_string(),
            action: task.action.to_string(),
            user_id: user_id.to_string(),
            context,
            timestamp: epoch_millis(self.clock.now()),
        };

        self.dispatch(task, &payload).await
    }

    /// Overrides win unconditionally, even when null. Required keys missing
    /// from both sources are present as null.
    pub async fn build_context(
        &self,
        task: &TaskDefinition,
        user_id: &str,
        overrides: ContextMap,
    ) -> ContextMap {
        let pending: Vec<ContextKey> = task
            .required_keys
            .iter()
            .copied()
            .filter(|key| !overrides.contains_key(key.as_str()))
            .collect();
        let resolved = self.resolver.resolve(user_id, &pending).await;

        let mut context = ContextMap::new();
        for key in task.required_keys {
            let value = resolved.get(key).cloned().unwrap_or(Value::Null);
            context.insert(key.as_str().to_string(), value);
        }
        for (key, value) in overrides {
            context.insert(key, value);
        }
        context
    }

    async fn dispatch(&self, task: &TaskDefinition, payload: &TaskPayload) -> CoreResult<Value> {
        let body = serde_json::to_vec(payload).map_err(|error| {
            CoreError::new(
                CoreErrorKind::Internal,
                format!("failed to encode task payload: {error}"),
            )
        })?;
        let request =
            HttpRequest::new(task.method, self.config.endpoint_url(task.endpoint)).json_body(body);

        let dispatch_timeout = self.config.dispatch_timeout;
        let response = timeout(
            dispatch_timeout,
            send_validated(self.transport.as_ref(), request),
        )
        .await
        .map_err(|_| {
            CoreError::new(
                CoreErrorKind::Timeout,
                format!(
                    "task '{}' did not respond within {}ms",
                    task.id,
                    dispatch_timeout.as_millis()
                ),
            )
        })??;

        response.into_json()
    }

    fn record(
        &self,
        task: &TaskDefinition,
        user_id: &str,
        started: Instant,
        outcome: &CoreResult<Value>,
    ) {
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let timestamp = self.clock.now();

        let record = match outcome {
            Ok(result) => {
                tracing::info!(task_id = task.id, user_id, duration_ms, "task dispatched");
                ExecutionRecord::succeeded(task.id, user_id, duration_ms, timestamp, result.clone())
            }
            Err(error) => {
                tracing::warn!(
                    task_id = task.id,
                    user_id,
                    duration_ms,
                    kind = ?error.kind,
                    status = ?error.status,
                    message = %error.message,
                    "task dispatch failed"
                );
                ExecutionRecord::failed(task.id, user_id, duration_ms, timestamp, error.to_string())
            }
        };

        self.history.record(user_id, record);
    }
}
