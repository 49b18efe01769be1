use crate::error::PoolError;
use crate::task::WorkerId;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

/// Capacity held by one admitted task execution.
///
/// Dropping the slot releases the capacity, so release happens on every exit
/// path of the task, including unwinding.
pub trait AdmissionSlot: Send + 'static {
  /// Identity of the worker behind this slot, if the admission primitive has one.
  fn worker_id(&self) -> Option<WorkerId> {
    None
  }
}

/// The primitive a `BoundedPool` uses to bound how many tasks run at once.
pub trait Admission: Send + Sync + 'static {
  type Slot: AdmissionSlot;

  /// Waits until capacity is available and takes one unit of it.
  ///
  /// No ordering between concurrent waiters is guaranteed.
  fn admit(&self) -> impl Future<Output = Result<Self::Slot, PoolError>> + Send;

  /// Total number of slots.
  fn capacity(&self) -> usize;

  /// Slots not currently held by any task.
  fn available(&self) -> usize;
}

/// Anonymous counting gate backed by a Tokio semaphore.
#[derive(Debug)]
pub struct SemaphoreGate {
  semaphore: Arc<Semaphore>,
  capacity: usize,
}

/// A semaphore permit held for the duration of one task.
#[derive(Debug)]
pub struct GatePermit {
  _permit: OwnedSemaphorePermit,
}

impl AdmissionSlot for GatePermit {}

impl SemaphoreGate {
  pub fn new(capacity: usize) -> Self {
    Self {
      semaphore: Arc::new(Semaphore::new(capacity)),
      capacity,
    }
  }
}

impl Admission for SemaphoreGate {
  type Slot = GatePermit;

  async fn admit(&self) -> Result<GatePermit, PoolError> {
    let permit = self
      .semaphore
      .clone()
      .acquire_owned()
      .await
      .map_err(|_| PoolError::GateClosed)?;
    trace!(available = self.semaphore.available_permits(), "Acquired semaphore permit.");
    Ok(GatePermit { _permit: permit })
  }

  fn capacity(&self) -> usize {
    self.capacity
  }

  fn available(&self) -> usize {
    self.semaphore.available_permits()
  }
}
