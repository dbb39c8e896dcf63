//! urlwatch-core: constants, configuration, and input validation shared
//! by every urlwatch crate.

use std::time::Duration;

pub mod config;
pub mod target;

pub use config::UrlwatchConfig;
pub use target::{ValidationError, validate_interval, validate_url};

/// Cadence of the due-check scheduler.
pub const TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound on a single probe, connect through response headers.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Smallest accepted check interval, in minutes.
pub const MIN_INTERVAL_MINUTES: u32 = 5;

/// Largest accepted check interval, in minutes.
pub const MAX_INTERVAL_MINUTES: u32 = 60;
