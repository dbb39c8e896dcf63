//! Domain types for the urlwatch state store.
//!
//! These types represent the persisted monitors and the health records
//! produced by probing them. All types are serializable to/from JSON for
//! storage in redb tables and for the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a monitor.
pub type MonitorId = u64;

/// Unique identifier for a health record.
pub type RecordId = u64;

// ── Monitor ───────────────────────────────────────────────────────

/// Scheduling status of a monitor. `Inactive` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStatus {
    Active,
    Inactive,
}

/// A registered URL plus its check cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Monitor {
    pub id: MonitorId,
    pub url: String,
    /// Minimum spacing between checks, in minutes (5..=60).
    pub check_interval: u32,
    pub status: MonitorStatus,
    pub created_at: DateTime<Utc>,
}

impl Monitor {
    pub fn is_active(&self) -> bool {
        self.status == MonitorStatus::Active
    }

    /// `check_interval` as a signed duration for timestamp arithmetic.
    pub fn interval(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::minutes(i64::from(self.check_interval))
    }

    /// Build the key for the monitors table.
    pub fn table_key(&self) -> String {
        monitor_key(self.id)
    }
}

pub(crate) fn monitor_key(id: MonitorId) -> String {
    format!("{id:020}")
}

// ── Health records ────────────────────────────────────────────────

/// The outcome of one executed check, before the store assigns an id.
///
/// Construct through [`NewHealthRecord::response`] or
/// [`NewHealthRecord::failure`]; exactly one of `status_code` and
/// `error_message` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewHealthRecord {
    pub monitor_id: MonitorId,
    pub status_code: Option<u16>,
    pub latency_ms: f64,
    pub is_up: bool,
    pub error_message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl NewHealthRecord {
    /// An HTTP response was received. Up iff the status is below 500.
    pub fn response(
        monitor_id: MonitorId,
        status_code: u16,
        latency_ms: f64,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            monitor_id,
            status_code: Some(status_code),
            latency_ms: latency_ms.max(0.0),
            is_up: status_code < 500,
            error_message: None,
            checked_at,
        }
    }

    /// No response was obtained.
    pub fn failure(
        monitor_id: MonitorId,
        error_message: impl Into<String>,
        latency_ms: f64,
        checked_at: DateTime<Utc>,
    ) -> Self {
        let mut error_message = error_message.into();
        if error_message.trim().is_empty() {
            error_message = "request failed".to_string();
        }
        Self {
            monitor_id,
            status_code: None,
            latency_ms: latency_ms.max(0.0),
            is_up: false,
            error_message: Some(error_message),
            checked_at,
        }
    }

    pub(crate) fn with_id(self, id: RecordId) -> HealthRecord {
        HealthRecord {
            id,
            monitor_id: self.monitor_id,
            status_code: self.status_code,
            latency_ms: self.latency_ms,
            is_up: self.is_up,
            error_message: self.error_message,
            checked_at: self.checked_at,
        }
    }
}

/// The immutable, persisted outcome of one executed check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthRecord {
    pub id: RecordId,
    pub monitor_id: MonitorId,
    pub status_code: Option<u16>,
    pub latency_ms: f64,
    pub is_up: bool,
    pub error_message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthRecord {
    /// Build the composite key for the health records table.
    pub fn table_key(&self) -> String {
        record_key(self.monitor_id, self.checked_at, self.id)
    }
}

pub(crate) fn record_key(monitor_id: MonitorId, checked_at: DateTime<Utc>, id: RecordId) -> String {
    // Pre-epoch timestamps clamp to zero; they cannot come from a probe.
    let millis = checked_at.timestamp_millis().max(0);
    format!("{monitor_id:020}:{millis:020}:{id:020}")
}

/// Half-open key range `[start, end)` covering every record of a monitor.
pub(crate) fn record_prefix_range(monitor_id: MonitorId) -> (String, String) {
    // ';' sorts directly after ':'.
    (format!("{monitor_id:020}:"), format!("{monitor_id:020};"))
}
