use crate::admission::{Admission, AdmissionSlot, SemaphoreGate};
use crate::counter::{CompletionCounter, CounterMode};
use crate::error::PoolError;
use crate::handle::WorkerRoster;
use crate::task::{TaskContext, WorkerId};

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle as TokioHandle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

lazy_static::lazy_static! {
  static ref NEXT_POOL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);
  static ref NEXT_EXECUTION_ID_COUNTER: AtomicU64 = AtomicU64::new(0);
}

/// Pool whose admission is an anonymous counting semaphore.
pub type GatedPool = BoundedPool<SemaphoreGate>;

/// Pool whose admission is a checkout of one of a fixed set of worker handles.
pub type WorkerPool = BoundedPool<WorkerRoster>;

/// Bounded-concurrency executor generic over its admission primitive.
///
/// `submit_all` spawns every task immediately. Only admission is bounded: at
/// most `capacity` tasks hold a slot at any moment, the rest wait inside
/// `Admission::admit`.
pub struct BoundedPool<A: Admission> {
  pool_id: u64,
  pool_name: Arc<String>,
  admission: Arc<A>,
  tokio_handle: TokioHandle,
  completed: Arc<CompletionCounter>,
  failed: Arc<AtomicU64>,
  // Keyed by execution id: task indices restart at 0 on every `submit_all`.
  active_tasks: Arc<DashMap<u64, (usize, Option<WorkerId>)>>,
  pending_join_handles: Mutex<Vec<JoinHandle<()>>>,
}

fn ensure_capacity(capacity: usize, pool_name: &str) -> Result<(), PoolError> {
  if capacity == 0 {
    error!(pool_name, "Rejecting pool with zero capacity: no task could ever be admitted.");
    return Err(PoolError::ZeroCapacity {
      pool: pool_name.to_string(),
    });
  }
  Ok(())
}

impl BoundedPool<SemaphoreGate> {
  /// Builds a semaphore-gated pool. Fails with `PoolError::ZeroCapacity` if `capacity` is 0.
  pub fn new(capacity: usize, tokio_handle: TokioHandle, pool_name: &str) -> Result<Self, PoolError> {
    Self::with_counter_mode(capacity, tokio_handle, pool_name, CounterMode::Atomic)
  }

  /// Like `new`, with an explicit `CounterMode`. Fails with `PoolError::ZeroCapacity` if `capacity` is 0.
  pub fn with_counter_mode(
    capacity: usize,
    tokio_handle: TokioHandle,
    pool_name: &str,
    counter_mode: CounterMode,
  ) -> Result<Self, PoolError> {
    ensure_capacity(capacity, pool_name)?;
    Ok(Self::from_admission(SemaphoreGate::new(capacity), tokio_handle, pool_name, counter_mode))
  }
}

impl BoundedPool<WorkerRoster> {
  /// Builds a pool of `capacity` worker handles. Fails with `PoolError::ZeroCapacity` if `capacity` is 0.
  pub fn new(capacity: usize, tokio_handle: TokioHandle, pool_name: &str) -> Result<Self, PoolError> {
    Self::with_counter_mode(capacity, tokio_handle, pool_name, CounterMode::Atomic)
  }

  /// Like `new`, with an explicit `CounterMode`. Fails with `PoolError::ZeroCapacity` if `capacity` is 0.
  pub fn with_counter_mode(
    capacity: usize,
    tokio_handle: TokioHandle,
    pool_name: &str,
    counter_mode: CounterMode,
  ) -> Result<Self, PoolError> {
    ensure_capacity(capacity, pool_name)?;
    let roster = WorkerRoster::new(capacity)?;
    Ok(Self::from_admission(roster, tokio_handle, pool_name, counter_mode))
  }

  /// Tasks served per worker, indexed by `WorkerId`.
  pub fn worker_loads(&self) -> Vec<u64> {
    self.admission.served_counts()
  }
}

impl<A: Admission> BoundedPool<A> {
  /// Wraps an already constructed admission primitive.
  ///
  /// Callers are responsible for the primitive having a non-zero capacity.
  pub fn from_admission(admission: A, tokio_handle: TokioHandle, pool_name: &str, counter_mode: CounterMode) -> Self {
    let pool_id = NEXT_POOL_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    info!(
      pool_name,
      pool_id,
      capacity = admission.capacity(),
      ?counter_mode,
      "Pool created."
    );
    Self {
      pool_id,
      pool_name: Arc::new(pool_name.to_string()),
      admission: Arc::new(admission),
      tokio_handle,
      completed: Arc::new(CompletionCounter::new(counter_mode)),
      failed: Arc::new(AtomicU64::new(0)),
      active_tasks: Arc::new(DashMap::new()),
      pending_join_handles: Mutex::new(Vec::new()),
    }
  }

  pub fn name(&self) -> &str {
    &self.pool_name
  }

  pub fn capacity(&self) -> usize {
    self.admission.capacity()
  }

  /// Slots that no task currently holds.
  pub fn available_capacity(&self) -> usize {
    self.admission.available()
  }

  /// Tasks that currently hold a slot and are running their work.
  pub fn active_task_count(&self) -> usize {
    self.active_tasks.len()
  }

  /// Spawned tasks not yet collected by `await_completion`.
  pub fn pending_task_count(&self) -> usize {
    self.pending_join_handles.lock().len()
  }

  pub fn counter_mode(&self) -> CounterMode {
    self.completed.mode()
  }

  /// Spawns `n` task executions at once, without waiting for capacity.
  ///
  /// Each execution waits for a slot, runs `work`, records its completion
  /// while still holding the slot, then releases the slot. A panic inside
  /// `work` is caught and counted in `failed_count` instead.
  pub fn submit_all<F, Fut>(&self, n: usize, work: F)
  where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    debug!(pool_name = %*self.pool_name, task_count = n, "Spawning task executions.");
    let work = Arc::new(work);
    let mut join_handles = Vec::with_capacity(n);

    for task_index in 0..n {
      let execution_id = NEXT_EXECUTION_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
      let admission = self.admission.clone();
      let completed = self.completed.clone();
      let failed = self.failed.clone();
      let active_tasks = self.active_tasks.clone();
      let work = work.clone();
      let pool_name = self.pool_name.clone();

      let join_handle = self.tokio_handle.spawn(
        async move {
          let slot = match admission.admit().await {
            Ok(slot) => slot,
            Err(admit_error) => {
              error!(pool_name = %*pool_name, task_index, "Task could not be admitted: {}", admit_error);
              failed.fetch_add(1, AtomicOrdering::AcqRel);
              return;
            }
          };
          let ctx = TaskContext {
            index: task_index,
            worker_id: slot.worker_id(),
          };
          active_tasks.insert(execution_id, (task_index, ctx.worker_id));
          trace!(pool_name = %*pool_name, task_index, worker_id = ?ctx.worker_id, "Task admitted.");

          match AssertUnwindSafe(async { work(ctx).await }).catch_unwind().await {
            Ok(()) => completed.record().await,
            Err(_panic_payload) => {
              error!(pool_name = %*pool_name, "{}", PoolError::TaskPanicked { task_index });
              failed.fetch_add(1, AtomicOrdering::AcqRel);
            }
          }

          active_tasks.remove(&execution_id);
          drop(slot);
          trace!(pool_name = %*pool_name, task_index, "Task released its slot.");
        }
        .instrument(info_span!("pool_task", pool_name = %*self.pool_name, task_index, execution_id)),
      );
      join_handles.push(join_handle);
    }

    self.pending_join_handles.lock().extend(join_handles);
  }

  /// Waits until every task spawned since the previous call has finished.
  ///
  /// Returns immediately if nothing is outstanding. The pool may be reused
  /// for another `submit_all` afterwards.
  pub async fn await_completion(&self) {
    let join_handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.pending_join_handles.lock());
    if join_handles.is_empty() {
      trace!(pool_name = %*self.pool_name, "No outstanding tasks to await.");
      return;
    }

    let outstanding = join_handles.len();
    debug!(pool_name = %*self.pool_name, outstanding, "Waiting for task executions to finish.");
    for join_handle in join_handles {
      if let Err(join_error) = join_handle.await {
        error!(pool_name = %*self.pool_name, "Task execution did not finish cleanly: {:?}", join_error);
      }
    }
    info!(
      pool_name = %*self.pool_name,
      completed = self.completed.get(),
      failed = self.failed.load(AtomicOrdering::Acquire),
      "All task executions finished."
    );
  }

  /// Completions recorded so far, across every `submit_all` cycle.
  ///
  /// Exact once `await_completion` has returned (in `CounterMode::Atomic`).
  pub fn completed_count(&self) -> u64 {
    self.completed.get()
  }

  /// Tasks whose work panicked or that could not be admitted.
  pub fn failed_count(&self) -> u64 {
    self.failed.load(AtomicOrdering::Acquire)
  }
}

impl<A: Admission> Drop for BoundedPool<A> {
  fn drop(&mut self) {
    let outstanding = self.pending_join_handles.get_mut().len();
    if outstanding > 0 {
      warn!(
        pool_name = %*self.pool_name,
        pool_id = self.pool_id,
        outstanding,
        "Pool dropped before awaiting completion. Spawned tasks keep running detached."
      );
    } else {
      trace!(pool_name = %*self.pool_name, pool_id = self.pool_id, "Pool dropped.");
    }
  }
}
