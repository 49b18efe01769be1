/// Identity of a pre-allocated worker handle, `0..capacity`.
pub type WorkerId = usize;

/// What a task execution knows about itself while it holds its admission slot.
///
/// Passed by value to the work closure given to `BoundedPool::submit_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskContext {
  pub(crate) index: usize,
  pub(crate) worker_id: Option<WorkerId>,
}

impl TaskContext {
  /// Returns the logical index of this task, `0..n` for a `submit_all(n, ..)` call.
  pub fn index(&self) -> usize {
    self.index
  }

  /// Returns the id of the borrowed worker handle.
  ///
  /// Always `None` for semaphore-gated pools, which hand out anonymous permits.
  pub fn worker_id(&self) -> Option<WorkerId> {
    self.worker_id
  }
}
