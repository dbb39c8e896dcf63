//! urlwatch-health: probing and scheduling for urlwatch.
//!
//! Provides the HTTP prober and the due-check scheduler. The scheduler
//! runs a single background loop that wakes every tick, decides which
//! active monitors are due from their latest health record, and spawns
//! one independent probe task per due monitor.
//!
//! # Architecture
//!
//! ```text
//! Scheduler (one task, 30s tick)
//!   ├── MonitorRegistry::list_monitors(active_only)
//!   ├── HealthRecordStore::latest_record → is_due()
//!   └── per due monitor: tokio::spawn (fire-and-forget)
//!       ├── in-flight guard (no overlapping probes per monitor)
//!       ├── semaphore permit (bounded concurrency)
//!       ├── Prober::probe() → NewHealthRecord
//!       └── HealthRecordStore::append_record
//! ```
//!
//! # Failure containment
//!
//! A probe never returns an error: connection failures, timeouts, and
//! malformed targets are recorded as `is_up = false` records. A storage
//! error during a tick aborts the rest of that tick only; the next tick
//! starts again from a fresh read.

pub mod error;
pub mod prober;
pub mod scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use prober::Prober;
pub use scheduler::{Scheduler, SchedulerHandle, is_due};
