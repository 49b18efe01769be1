use std::sync::atomic::{AtomicU64, Ordering};

/// How a pool records task completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterMode {
  /// Every completion is a single atomic `fetch_add`. Never loses an increment.
  #[default]
  Atomic,
  /// Read, yield, then write back. Concurrent completions overwrite each other,
  /// so the final count may be lower than the number of completed tasks.
  /// Mirrors a plain `counter++` shared between goroutines.
  Unsynchronized,
}

/// Counts completed task executions for a pool.
#[derive(Debug, Default)]
pub struct CompletionCounter {
  value: AtomicU64,
  mode: CounterMode,
}

impl CompletionCounter {
  pub fn new(mode: CounterMode) -> Self {
    Self {
      value: AtomicU64::new(0),
      mode,
    }
  }

  pub fn mode(&self) -> CounterMode {
    self.mode
  }

  /// Records one completion.
  ///
  /// In `Unsynchronized` mode the load and the store are separated by a
  /// scheduler yield, which widens the window in which another task's
  /// increment is lost.
  pub async fn record(&self) {
    match self.mode {
      CounterMode::Atomic => {
        self.value.fetch_add(1, Ordering::AcqRel);
      }
      CounterMode::Unsynchronized => {
        let observed = self.value.load(Ordering::Relaxed);
        tokio::task::yield_now().await;
        self.value.store(observed + 1, Ordering::Relaxed);
      }
    }
  }

  /// Current value. Only final once every recording task has finished.
  pub fn get(&self) -> u64 {
    self.value.load(Ordering::Acquire)
  }
}
