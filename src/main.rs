use admission_pools::benchmark::{compare, BenchmarkConfig};
use admission_pools::{telemetry, PoolError};

use tokio::runtime::Handle;

#[tokio::main]
async fn main() -> Result<(), PoolError> {
  telemetry::init_tracing();

  let config = BenchmarkConfig::default();
  let comparison = compare(&config, Handle::current()).await?;
  println!("{comparison}");
  Ok(())
}
