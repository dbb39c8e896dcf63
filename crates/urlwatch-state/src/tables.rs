//! redb table definitions for the urlwatch state store.
//!
//! Data tables use `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Numeric key components are zero-padded to 20 digits so that
//! lexical key order matches numeric order.

use redb::TableDefinition;

/// Monitors keyed by `{id:020}`.
pub const MONITORS: TableDefinition<&str, &[u8]> = TableDefinition::new("monitors");

/// Health records keyed by `{monitor_id:020}:{checked_at_ms:020}:{id:020}`.
pub const HEALTH_RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("health_records");

/// Last assigned id per entity kind.
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub const MONITOR_SEQ: &str = "monitor";
pub const RECORD_SEQ: &str = "health_record";
