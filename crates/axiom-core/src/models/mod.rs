pub mod context;
pub mod error;
pub mod execution;
pub mod task;

pub use context::{ContextKey, ContextMap};
pub use error::{CoreError, CoreErrorKind, CoreResult};
pub use execution::{ExecutionRecord, ExecutionSummary};
pub use task::{HttpMethod, TaskCategory, TaskDefinition};
