use crate::admission::{Admission, AdmissionSlot};
use crate::error::PoolError;
use crate::task::WorkerId;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, trace};

/// One of a fixed set of reusable execution slots.
///
/// Carries only its identity. It is created once by `WorkerRoster::new` and
/// lives for as long as the roster does.
#[derive(Debug, PartialEq, Eq)]
pub struct WorkerHandle {
  id: WorkerId,
}

impl WorkerHandle {
  /// Returns the id of this worker.
  pub fn id(&self) -> WorkerId {
    self.id
  }
}

/// Pre-allocated worker handles stored in a bounded MPMC channel.
///
/// The channel capacity equals the number of handles, so a check-in can never
/// find the channel full.
pub struct WorkerRoster {
  idle_tx: kanal::AsyncSender<WorkerHandle>,
  idle_rx: kanal::AsyncReceiver<WorkerHandle>,
  capacity: usize,
  served: Arc<Mutex<Vec<u64>>>,
}

impl WorkerRoster {
  /// Allocates `capacity` handles with ids `0..capacity` and parks them all as idle.
  pub fn new(capacity: usize) -> Result<Self, PoolError> {
    let (idle_tx, idle_rx) = kanal::bounded_async(capacity);
    for id in 0..capacity {
      match idle_tx.try_send(WorkerHandle { id }) {
        Ok(true) => {}
        Ok(false) | Err(_) => {
          error!(worker_id = id, capacity, "Could not park a freshly allocated worker handle.");
          return Err(PoolError::RosterClosed);
        }
      }
    }
    Ok(Self {
      idle_tx,
      idle_rx,
      capacity,
      served: Arc::new(Mutex::new(vec![0; capacity])),
    })
  }

  /// Number of tasks each worker has served, indexed by `WorkerId`.
  ///
  /// A task counts once its handle is checked back in.
  pub fn served_counts(&self) -> Vec<u64> {
    self.served.lock().clone()
  }
}

impl fmt::Debug for WorkerRoster {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WorkerRoster")
      .field("capacity", &self.capacity)
      .field("idle", &self.idle_rx.len())
      .finish_non_exhaustive()
  }
}

impl Admission for WorkerRoster {
  type Slot = CheckedOutWorker;

  async fn admit(&self) -> Result<CheckedOutWorker, PoolError> {
    let handle = self.idle_rx.recv().await.map_err(|_| PoolError::RosterClosed)?;
    trace!(worker_id = handle.id, idle = self.idle_rx.len(), "Checked out worker.");
    Ok(CheckedOutWorker {
      handle: Some(handle),
      idle_tx: self.idle_tx.clone(),
      served: self.served.clone(),
    })
  }

  fn capacity(&self) -> usize {
    self.capacity
  }

  fn available(&self) -> usize {
    self.idle_rx.len()
  }
}

/// A worker handle borrowed by exactly one task. Checked back in on drop.
pub struct CheckedOutWorker {
  handle: Option<WorkerHandle>,
  idle_tx: kanal::AsyncSender<WorkerHandle>,
  served: Arc<Mutex<Vec<u64>>>,
}

impl fmt::Debug for CheckedOutWorker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CheckedOutWorker")
      .field("handle", &self.handle)
      .finish_non_exhaustive()
  }
}

impl AdmissionSlot for CheckedOutWorker {
  fn worker_id(&self) -> Option<WorkerId> {
    self.handle.as_ref().map(WorkerHandle::id)
  }
}

impl Drop for CheckedOutWorker {
  fn drop(&mut self) {
    let Some(handle) = self.handle.take() else {
      return;
    };
    let worker_id = handle.id;
    if let Some(count) = self.served.lock().get_mut(worker_id) {
      *count += 1;
    }
    match self.idle_tx.try_send(handle) {
      Ok(true) => trace!(worker_id, "Checked in worker."),
      Ok(false) | Err(_) => error!(worker_id, "Worker handle could not be checked back in and is lost."),
    }
  }
}
