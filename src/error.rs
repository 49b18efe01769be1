use thiserror::Error;

/// Errors that can occur within an `admission_pools` pool.
#[derive(Error, Debug, PartialEq)]
pub enum PoolError {
  #[error("Pool '{pool}' was configured with zero capacity; no task could ever be admitted")]
  ZeroCapacity { pool: String },

  #[error("Pool's admission semaphore was closed unexpectedly")]
  GateClosed,

  #[error("Pool's worker roster channel was closed unexpectedly")]
  RosterClosed,

  #[error("Task {task_index} panicked during execution")]
  TaskPanicked { task_index: usize },
}
