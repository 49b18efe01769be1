use admission_pools::benchmark::{
  compare, run_benchmark, BenchmarkConfig, Comparison, RunReport, APACHE_POOL_NAME, SIMPLE_POOL_NAME,
};
use admission_pools::{CounterMode, GatedPool, PoolError, WorkerPool};
use std::time::Duration;
use tokio::runtime::Handle;

fn report(pool_name: &str, completed_tasks: u64, elapsed: Duration) -> RunReport {
  RunReport {
    pool_name: pool_name.to_string(),
    completed_tasks,
    failed_tasks: 0,
    elapsed,
  }
}

#[test]
fn test_default_config_matches_reference_workload() {
  let config = BenchmarkConfig::default();
  assert_eq!(config.worker_count, 1000);
  assert_eq!(config.task_count, 1000);
  assert_eq!(config.work_delay, Duration::from_millis(100));
  assert_eq!(config.counter_mode, CounterMode::Atomic);

  let tuned = BenchmarkConfig::new()
    .with_worker_count(4)
    .with_task_count(12)
    .with_work_delay(Duration::from_millis(5))
    .with_counter_mode(CounterMode::Unsynchronized);
  assert_eq!(tuned.worker_count, 4);
  assert_eq!(tuned.task_count, 12);
  assert_eq!(tuned.work_delay, Duration::from_millis(5));
  assert_eq!(tuned.counter_mode, CounterMode::Unsynchronized);
}

#[test]
fn test_percentage_difference() {
  let slower_second = Comparison {
    first: report("a", 10, Duration::from_millis(200)),
    second: report("b", 10, Duration::from_millis(250)),
  };
  assert!((slower_second.percentage_difference() - 25.0).abs() < 1e-9);

  let faster_second = Comparison {
    first: report("a", 10, Duration::from_millis(200)),
    second: report("b", 10, Duration::from_millis(150)),
  };
  assert!((faster_second.percentage_difference() + 25.0).abs() < 1e-9);

  let instant_first = Comparison {
    first: report("a", 0, Duration::ZERO),
    second: report("b", 0, Duration::from_millis(5)),
  };
  assert_eq!(instant_first.percentage_difference(), 0.0);
}

#[test]
fn test_output_format() {
  let comparison = Comparison {
    first: report(SIMPLE_POOL_NAME, 1000, Duration::from_millis(100)),
    second: report(APACHE_POOL_NAME, 1000, Duration::from_millis(102)),
  };
  let expected = "Simple Thread Pool Results:\n\
                  Completed Tasks: 1000\n\
                  Total Time: 100ms\n\
                  \n\
                  Apache Thread Pool Results:\n\
                  Completed Tasks: 1000\n\
                  Total Time: 102ms\n\
                  \n\
                  Performance Difference: 2.00%";
  assert_eq!(comparison.to_string(), expected);
}

#[tokio::test(start_paused = true)]
async fn test_run_benchmark_reports_completed_tasks_and_elapsed() {
  let config = BenchmarkConfig::new()
    .with_worker_count(5)
    .with_task_count(20)
    .with_work_delay(Duration::from_millis(10));

  let report = run_benchmark(
    || WorkerPool::new(config.worker_count, Handle::current(), "bench_workers"),
    &config,
  )
  .await
  .unwrap();
  assert_eq!(report.pool_name, "bench_workers");
  assert_eq!(report.completed_tasks, 20);
  assert_eq!(report.failed_tasks, 0);
  assert!(report.elapsed >= Duration::from_millis(40));
  assert!(report.elapsed < Duration::from_millis(60));
}

// Real clock: the builder blocks the thread, which a paused clock would not see.
#[tokio::test]
async fn test_run_benchmark_times_pool_construction() {
  let config = BenchmarkConfig::new()
    .with_worker_count(4)
    .with_task_count(8)
    .with_work_delay(Duration::from_millis(5));
  let construction = Duration::from_millis(60);

  let report = run_benchmark(
    || {
      std::thread::sleep(construction);
      GatedPool::new(config.worker_count, Handle::current(), "slow_to_build")
    },
    &config,
  )
  .await
  .unwrap();

  assert_eq!(report.completed_tasks, 8);
  // Two waves of 5ms on top of the construction time.
  assert!(
    report.elapsed >= construction + Duration::from_millis(10),
    "elapsed {:?} must include pool construction",
    report.elapsed
  );
}

#[tokio::test]
async fn test_run_benchmark_propagates_construction_errors() {
  let config = BenchmarkConfig::new().with_worker_count(0).with_task_count(3);
  let result = run_benchmark(
    || WorkerPool::new(config.worker_count, Handle::current(), "never_built"),
    &config,
  )
  .await;
  assert_eq!(
    result,
    Err(PoolError::ZeroCapacity {
      pool: "never_built".to_string()
    })
  );
}

#[tokio::test(start_paused = true)]
async fn test_compare_runs_both_pools_in_order() {
  let config = BenchmarkConfig::new()
    .with_worker_count(10)
    .with_task_count(30)
    .with_work_delay(Duration::from_millis(100));

  let comparison = compare(&config, Handle::current()).await.unwrap();
  assert_eq!(comparison.first.pool_name, SIMPLE_POOL_NAME);
  assert_eq!(comparison.second.pool_name, APACHE_POOL_NAME);
  for run in [&comparison.first, &comparison.second] {
    assert_eq!(run.completed_tasks, 30);
    assert!(run.elapsed >= Duration::from_millis(300));
    assert!(run.elapsed < Duration::from_millis(400));
  }

  let rendered = comparison.to_string();
  assert!(rendered.starts_with("Simple Thread Pool Results:\nCompleted Tasks: 30\nTotal Time: "));
  assert!(rendered.contains("\n\nApache Thread Pool Results:\nCompleted Tasks: 30\n"));
  assert!(rendered.contains("\n\nPerformance Difference: "));
  assert!(rendered.ends_with('%'));
}

#[tokio::test]
async fn test_compare_rejects_zero_workers() {
  let config = BenchmarkConfig::new().with_worker_count(0).with_task_count(3);
  let result = compare(&config, Handle::current()).await;
  assert_eq!(
    result,
    Err(PoolError::ZeroCapacity {
      pool: SIMPLE_POOL_NAME.to_string()
    })
  );
}

#[tokio::test(start_paused = true)]
async fn test_run_benchmark_with_no_tasks() {
  let config = BenchmarkConfig::new().with_worker_count(2).with_task_count(0);
  let report = run_benchmark(|| GatedPool::new(2, Handle::current(), "empty_run"), &config)
    .await
    .unwrap();
  assert_eq!(report.completed_tasks, 0);
  assert_eq!(report.elapsed, Duration::ZERO);
}
