//! Sequential head-to-head run of a gated pool and a worker-handle pool over
//! the same synthetic workload.

use crate::admission::Admission;
use crate::counter::CounterMode;
use crate::error::PoolError;
use crate::pool::{BoundedPool, GatedPool, WorkerPool};

use std::fmt;
use std::time::Duration;

use tokio::runtime::Handle as TokioHandle;
use tokio::time::Instant;
use tracing::info;

/// Display name of the semaphore-gated pool in benchmark output.
pub const SIMPLE_POOL_NAME: &str = "Simple Thread Pool";
/// Display name of the pre-allocated worker pool in benchmark output.
pub const APACHE_POOL_NAME: &str = "Apache Thread Pool";

/// Shape of the synthetic workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkConfig {
  /// Capacity of each pool.
  pub worker_count: usize,
  /// Tasks submitted to each pool.
  pub task_count: usize,
  /// Fixed duration every task sleeps for.
  pub work_delay: Duration,
  pub counter_mode: CounterMode,
}

impl Default for BenchmarkConfig {
  fn default() -> Self {
    Self {
      worker_count: 1000,
      task_count: 1000,
      work_delay: Duration::from_millis(100),
      counter_mode: CounterMode::Atomic,
    }
  }
}

impl BenchmarkConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_worker_count(mut self, worker_count: usize) -> Self {
    self.worker_count = worker_count;
    self
  }

  pub fn with_task_count(mut self, task_count: usize) -> Self {
    self.task_count = task_count;
    self
  }

  pub fn with_work_delay(mut self, work_delay: Duration) -> Self {
    self.work_delay = work_delay;
    self
  }

  pub fn with_counter_mode(mut self, counter_mode: CounterMode) -> Self {
    self.counter_mode = counter_mode;
    self
  }
}

/// Outcome of running the workload through one pool.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
  pub pool_name: String,
  pub completed_tasks: u64,
  pub failed_tasks: u64,
  pub elapsed: Duration,
}

impl fmt::Display for RunReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{} Results:", self.pool_name)?;
    writeln!(f, "Completed Tasks: {}", self.completed_tasks)?;
    write!(f, "Total Time: {:?}", self.elapsed)
  }
}

/// Two runs of the same workload, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
  pub first: RunReport,
  pub second: RunReport,
}

impl Comparison {
  /// `(second - first) / first * 100`. Positive means the second pool was slower.
  ///
  /// Zero when the first run took no measurable time.
  pub fn percentage_difference(&self) -> f64 {
    let first = self.first.elapsed.as_secs_f64();
    if first == 0.0 {
      return 0.0;
    }
    (self.second.elapsed.as_secs_f64() - first) / first * 100.0
  }
}

impl fmt::Display for Comparison {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", self.first)?;
    writeln!(f)?;
    writeln!(f, "{}", self.second)?;
    writeln!(f)?;
    write!(f, "Performance Difference: {:.2}%", self.percentage_difference())
  }
}

/// Builds a pool with `build`, then runs `task_count` sleeping tasks through it.
///
/// The timed window starts before `build` is called, so pool construction
/// (allocating and parking every worker handle, for a `WorkerPool`) counts
/// towards `elapsed`.
pub async fn run_benchmark<A, B>(build: B, config: &BenchmarkConfig) -> Result<RunReport, PoolError>
where
  A: Admission,
  B: FnOnce() -> Result<BoundedPool<A>, PoolError>,
{
  let work_delay = config.work_delay;

  let start = Instant::now();
  let pool = build()?;
  pool.submit_all(config.task_count, move |_ctx| tokio::time::sleep(work_delay));
  pool.await_completion().await;
  let elapsed = start.elapsed();

  let report = RunReport {
    pool_name: pool.name().to_string(),
    completed_tasks: pool.completed_count(),
    failed_tasks: pool.failed_count(),
    elapsed,
  };
  info!(
    pool_name = %report.pool_name,
    completed = report.completed_tasks,
    elapsed = ?report.elapsed,
    "Benchmark run finished."
  );
  Ok(report)
}

/// Runs the workload through the gated pool, then through the worker pool.
pub async fn compare(config: &BenchmarkConfig, tokio_handle: TokioHandle) -> Result<Comparison, PoolError> {
  let simple_handle = tokio_handle.clone();
  let first = run_benchmark(
    || {
      GatedPool::with_counter_mode(
        config.worker_count,
        simple_handle,
        SIMPLE_POOL_NAME,
        config.counter_mode,
      )
    },
    config,
  )
  .await?;

  let second = run_benchmark(
    || {
      WorkerPool::with_counter_mode(
        config.worker_count,
        tokio_handle,
        APACHE_POOL_NAME,
        config.counter_mode,
      )
    },
    config,
  )
  .await?;

  Ok(Comparison { first, second })
}
