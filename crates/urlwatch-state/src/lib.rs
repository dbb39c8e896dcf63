//! urlwatch-state: embedded store for urlwatch.
//!
//! Backed by [redb](https://docs.rs/redb), provides the monitor registry
//! and the append-only health record log, on disk or in memory.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Health records use the composite key `{monitor_id}:{checked_at_ms}:{id}`,
//! zero-padded, so a reverse range scan over one monitor's prefix yields
//! its history most-recent-first.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks. Code that only needs the
//! collaborator contracts depends on the [`MonitorRegistry`] and
//! [`HealthRecordStore`] traits instead.

pub mod error;
pub mod registry;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use registry::{HealthRecordStore, MonitorRegistry};
pub use store::StateStore;
pub use types::*;
