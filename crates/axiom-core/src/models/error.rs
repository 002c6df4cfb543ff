use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoreErrorKind {
    NotFound,
    HttpStatus,
    Transport,
    Timeout,
    InvalidResponse,
    Cancelled,
    InvalidInput,
    Internal,
}

impl CoreErrorKind {
    pub fn is_network(self) -> bool {
        matches!(
            self,
            CoreErrorKind::HttpStatus
                | CoreErrorKind::Transport
                | CoreErrorKind::Timeout
                | CoreErrorKind::InvalidResponse
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{kind:?}: {message}")]
pub struct CoreError {
    pub task: Option<String>,
    pub user: Option<String>,
    pub kind: CoreErrorKind,
    pub status: Option<u16>,
    pub response_body: Option<String>,
    pub message: String,
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            task: None,
            user: None,
            kind,
            status: None,
            response_body: None,
            message: message.into(),
        }
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            CoreErrorKind::NotFound,
            format!("no task is registered with id '{task_id}'"),
        )
        .for_task(task_id)
    }

    pub fn http_status(status: u16, body: String) -> Self {
        Self {
            status: Some(status),
            message: format!("request failed with status {status}: {body}"),
            response_body: Some(body),
            ..Self::new(CoreErrorKind::HttpStatus, String::new())
        }
    }

    pub fn for_task(mut self, task_id: &str) -> Self {
        self.task.get_or_insert_with(|| task_id.to_string());
        self
    }

    pub fn for_user(mut self, user_id: &str) -> Self {
        self.user.get_or_insert_with(|| user_id.to_string());
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == CoreErrorKind::NotFound
    }

    /// Non-2xx responses, transport failures, timeouts and undecodable bodies.
    pub fn is_network_error(&self) -> bool {
        self.kind.is_network()
    }
}
