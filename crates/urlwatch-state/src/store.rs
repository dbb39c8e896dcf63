//! StateStore: redb-backed persistence for urlwatch.
//!
//! Provides the monitor registry and the health record log. All values are
//! JSON-serialized into redb's `&[u8]` value columns. The store supports
//! both on-disk and in-memory backends (the latter for testing).
//!
//! Every mutation is a single write transaction, so concurrent appends
//! from independent probe tasks never interleave partially. Reads run in
//! their own read transaction and see a consistent snapshot.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::registry::{HealthRecordStore, MonitorRegistry};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(MONITORS).map_err(map_err!(Table))?;
        txn.open_table(HEALTH_RECORDS).map_err(map_err!(Table))?;
        txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Monitors ───────────────────────────────────────────────────

    /// Validate input and insert a new active monitor.
    pub fn create_monitor(&self, url: &str, check_interval: u32) -> StateResult<Monitor> {
        let url = urlwatch_core::validate_url(url)?;
        let check_interval = urlwatch_core::validate_interval(check_interval)?;

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let monitor = Monitor {
            id: next_id(&txn, MONITOR_SEQ)?,
            url,
            check_interval,
            status: MonitorStatus::Active,
            created_at: Utc::now(),
        };
        let value = serde_json::to_vec(&monitor).map_err(map_err!(Serialize))?;
        {
            let mut table = txn.open_table(MONITORS).map_err(map_err!(Table))?;
            table
                .insert(monitor.table_key().as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(monitor_id = monitor.id, url = %monitor.url, interval = monitor.check_interval, "monitor created");
        Ok(monitor)
    }

    /// Get a monitor by id.
    pub fn get_monitor(&self, id: MonitorId) -> StateResult<Option<Monitor>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MONITORS).map_err(map_err!(Table))?;
        match table.get(monitor_key(id).as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let monitor: Monitor =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(monitor))
            }
            None => Ok(None),
        }
    }

    /// List monitors in id order, optionally only the active ones.
    pub fn list_monitors(&self, active_only: bool) -> StateResult<Vec<Monitor>> {
        self.scan_monitors(|m| !active_only || m.is_active(), 0, usize::MAX)
    }

    /// One page of all monitors (active and inactive) in id order.
    pub fn list_monitors_page(&self, skip: usize, limit: usize) -> StateResult<Vec<Monitor>> {
        self.scan_monitors(|_| true, skip, limit)
    }

    fn scan_monitors(
        &self,
        keep: impl Fn(&Monitor) -> bool,
        skip: usize,
        limit: usize,
    ) -> StateResult<Vec<Monitor>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MONITORS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        let mut skipped = 0;
        for entry in table.iter().map_err(map_err!(Read))? {
            if results.len() >= limit {
                break;
            }
            let (_, value) = entry.map_err(map_err!(Read))?;
            let monitor: Monitor =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if !keep(&monitor) {
                continue;
            }
            if skipped < skip {
                skipped += 1;
                continue;
            }
            results.push(monitor);
        }
        Ok(results)
    }

    /// Mark a monitor inactive. Returns false if it does not exist.
    ///
    /// Deactivating an already inactive monitor succeeds and changes nothing.
    pub fn deactivate_monitor(&self, id: MonitorId) -> StateResult<bool> {
        let key = monitor_key(id);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(MONITORS).map_err(map_err!(Table))?;
            let current: Option<Monitor> = match table.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => Some(
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?,
                ),
                None => None,
            };
            existed = current.is_some();
            if let Some(mut monitor) = current.filter(Monitor::is_active) {
                monitor.status = MonitorStatus::Inactive;
                let value = serde_json::to_vec(&monitor).map_err(map_err!(Serialize))?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(monitor_id = id, existed, "monitor deactivated");
        Ok(existed)
    }

    // ── Health records ─────────────────────────────────────────────

    /// Append one health record, assigning its id.
    pub fn append_record(&self, record: NewHealthRecord) -> StateResult<HealthRecord> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let record = record.with_id(next_id(&txn, RECORD_SEQ)?);
        let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
        {
            let mut table = txn.open_table(HEALTH_RECORDS).map_err(map_err!(Table))?;
            table
                .insert(record.table_key().as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(record)
    }

    /// Most recent health record for a monitor.
    pub fn latest_record(&self, monitor_id: MonitorId) -> StateResult<Option<HealthRecord>> {
        Ok(self.list_recent_records(monitor_id, 1)?.into_iter().next())
    }

    /// Recent health records for a monitor, most recent first
    /// (reverse scan of the monitor's key range).
    pub fn list_recent_records(
        &self,
        monitor_id: MonitorId,
        limit: usize,
    ) -> StateResult<Vec<HealthRecord>> {
        let (start, end) = record_prefix_range(monitor_id);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HEALTH_RECORDS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table
            .range(start.as_str()..end.as_str())
            .map_err(map_err!(Read))?
            .rev()
        {
            if results.len() >= limit {
                break;
            }
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: HealthRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }
}

/// Bump and return the sequence named `seq` inside an open write transaction.
fn next_id(txn: &WriteTransaction, seq: &str) -> StateResult<u64> {
    let mut table = txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
    let next = table
        .get(seq)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value())
        .unwrap_or(0)
        + 1;
    table.insert(seq, next).map_err(map_err!(Write))?;
    Ok(next)
}

impl MonitorRegistry for StateStore {
    fn create_monitor(&self, url: &str, check_interval: u32) -> StateResult<Monitor> {
        StateStore::create_monitor(self, url, check_interval)
    }

    fn list_monitors(&self, active_only: bool) -> StateResult<Vec<Monitor>> {
        StateStore::list_monitors(self, active_only)
    }

    fn get_monitor(&self, id: MonitorId) -> StateResult<Option<Monitor>> {
        StateStore::get_monitor(self, id)
    }

    fn deactivate_monitor(&self, id: MonitorId) -> StateResult<bool> {
        StateStore::deactivate_monitor(self, id)
    }
}

impl HealthRecordStore for StateStore {
    fn append_record(&self, record: NewHealthRecord) -> StateResult<HealthRecord> {
        StateStore::append_record(self, record)
    }

    fn latest_record(&self, monitor_id: MonitorId) -> StateResult<Option<HealthRecord>> {
        StateStore::latest_record(self, monitor_id)
    }

    fn list_recent_records(
        &self,
        monitor_id: MonitorId,
        limit: usize,
    ) -> StateResult<Vec<HealthRecord>> {
        StateStore::list_recent_records(self, monitor_id, limit)
    }
}
