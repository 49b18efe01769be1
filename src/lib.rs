//! Two Tokio-based bounded-concurrency pools and a harness that races them.
//!
//! Both pools spawn every submitted task at once and bound only admission:
//! `GatedPool` through an anonymous semaphore permit, `WorkerPool` through a
//! checkout of one of a fixed set of `WorkerHandle`s.

mod admission;
pub mod benchmark;
mod counter;
mod error;
mod handle;
mod pool;
mod task;
pub mod telemetry;

pub use admission::{Admission, AdmissionSlot, GatePermit, SemaphoreGate};
pub use counter::{CompletionCounter, CounterMode};
pub use error::PoolError;
pub use handle::{CheckedOutWorker, WorkerHandle, WorkerRoster};
pub use pool::{BoundedPool, GatedPool, WorkerPool};
pub use task::{TaskContext, WorkerId};
