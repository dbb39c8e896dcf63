//! Collaborator contracts consumed by the scheduler and the API.
//!
//! [`StateStore`](crate::StateStore) implements both traits; tests can
//! substitute their own implementations to inject storage failures.

use crate::error::StateResult;
use crate::types::*;

/// Durable set of monitor definitions.
pub trait MonitorRegistry {
    /// Validate and register a new, active monitor.
    fn create_monitor(&self, url: &str, check_interval: u32) -> StateResult<Monitor>;

    /// List monitors ordered by id, optionally only active ones.
    fn list_monitors(&self, active_only: bool) -> StateResult<Vec<Monitor>>;

    fn get_monitor(&self, id: MonitorId) -> StateResult<Option<Monitor>>;

    /// Soft delete. Returns false if the monitor does not exist.
    fn deactivate_monitor(&self, id: MonitorId) -> StateResult<bool>;
}

/// Append-only log of check outcomes, keyed by monitor.
pub trait HealthRecordStore {
    /// Persist one record and return it with its assigned id.
    fn append_record(&self, record: NewHealthRecord) -> StateResult<HealthRecord>;

    /// Most recent record of a monitor by `checked_at`, if any.
    fn latest_record(&self, monitor_id: MonitorId) -> StateResult<Option<HealthRecord>>;

    /// Up to `limit` records of a monitor, most recent first.
    fn list_recent_records(
        &self,
        monitor_id: MonitorId,
        limit: usize,
    ) -> StateResult<Vec<HealthRecord>>;
}
