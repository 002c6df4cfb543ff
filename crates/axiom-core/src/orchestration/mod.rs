pub mod cancellation;
pub mod dispatcher;
pub mod history;

pub use cancellation::DispatchCancellationToken;
pub use dispatcher::{TaskDispatcher, TaskPayload};
pub use history::{DEFAULT_HISTORY_CAPACITY, ExecutionHistory};
