//! Message codec
//!
//! Converts between the canonical record list (Unix-epoch milliseconds)
//! and:
//! - the JSON interchange list (`address`, `body`, `date`, `type`, `read`,
//!   `thread_id`, all string-typed)
//! - the iOS native message store (SQLite), read through a read-only
//!   connection
//!
//! # Native epoch
//!
//! The iOS store counts from 2001-01-01T00:00:00Z, 978,307,200 seconds
//! after the Unix epoch. Older stores hold seconds, newer ones nanoseconds;
//! values above 1e12 are treated as nanoseconds.

use crate::core::error::{Result, TransferError};
use log::{debug, warn};
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Seconds between the Unix epoch and the iOS reference date
pub const NATIVE_EPOCH_OFFSET_SECS: i64 = 978_307_200;

/// Native timestamps above this are nanoseconds
const NANOSECOND_THRESHOLD: i64 = 1_000_000_000_000;

/// `type` value for received messages
pub const TYPE_INBOX: &str = "1";
/// `type` value for sent messages
pub const TYPE_SENT: &str = "2";

/// Message direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One message in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsEntry {
    pub address: String,
    pub body: String,
    /// Milliseconds since the Unix epoch, whatever the source platform
    pub timestamp_ms: i64,
    pub direction: Direction,
    pub read: bool,
    pub thread_id: i64,
}

/// Convert a native-store timestamp to Unix-epoch milliseconds
pub fn native_to_unix_ms(raw: i64) -> i64 {
    if raw > NANOSECOND_THRESHOLD {
        (raw / 1_000_000).saturating_add(NATIVE_EPOCH_OFFSET_SECS * 1000)
    } else {
        raw.saturating_add(NATIVE_EPOCH_OFFSET_SECS).saturating_mul(1000)
    }
}

/// Unix-epoch milliseconds to native nanoseconds (current store format)
pub fn unix_ms_to_native_nanos(unix_ms: i64) -> i64 {
    unix_ms
        .saturating_sub(NATIVE_EPOCH_OFFSET_SECS * 1000)
        .saturating_mul(1_000_000)
}

/// Unix-epoch milliseconds to native seconds (legacy store format)
pub fn unix_ms_to_native_seconds(unix_ms: i64) -> i64 {
    unix_ms.div_euclid(1000).saturating_sub(NATIVE_EPOCH_OFFSET_SECS)
}

/// Accept `"123"` as well as `123` for string-typed interchange keys
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
        Null(()),
    }

    Ok(match Loose::deserialize(deserializer)? {
        Loose::Str(s) => s,
        Loose::Int(i) => i.to_string(),
        Loose::Float(f) => (f as i64).to_string(),
        Loose::Bool(b) => String::from(if b { "1" } else { "0" }),
        Loose::Null(()) => String::new(),
    })
}

/// One element of the JSON interchange array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmsRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub address: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub body: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub date: String,
    #[serde(rename = "type", default, deserialize_with = "string_or_number")]
    pub kind: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub read: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub thread_id: String,
}

impl From<&SmsEntry> for SmsRecord {
    fn from(entry: &SmsEntry) -> Self {
        Self {
            address: entry.address.clone(),
            body: entry.body.clone(),
            date: entry.timestamp_ms.to_string(),
            kind: match entry.direction {
                Direction::Inbound => TYPE_INBOX,
                Direction::Outbound => TYPE_SENT,
            }
            .to_string(),
            read: if entry.read { "1" } else { "0" }.to_string(),
            thread_id: entry.thread_id.to_string(),
        }
    }
}

impl From<&SmsRecord> for SmsEntry {
    fn from(record: &SmsRecord) -> Self {
        Self {
            address: record.address.clone(),
            body: record.body.clone(),
            timestamp_ms: record.date.trim().parse().unwrap_or(0),
            direction: if record.kind.trim() == TYPE_SENT {
                Direction::Outbound
            } else {
                Direction::Inbound
            },
            read: record.read.trim() == "1",
            thread_id: record.thread_id.trim().parse().unwrap_or(0),
        }
    }
}

/// Parse the JSON interchange list
///
/// Malformed input yields an empty list.
pub fn parse_messages_json(text: &str) -> Vec<SmsEntry> {
    match serde_json::from_str::<Vec<SmsRecord>>(text) {
        Ok(records) => records.iter().map(SmsEntry::from).collect(),
        Err(e) => {
            warn!("Unreadable message interchange file: {}", e);
            Vec::new()
        }
    }
}

/// Render the JSON interchange list
pub fn write_messages_json(entries: &[SmsEntry]) -> Result<String> {
    let records: Vec<SmsRecord> = entries.iter().map(SmsRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

const NATIVE_QUERY: &str = "\
    SELECT COALESCE(h.id, ''), COALESCE(m.text, ''), m.date, m.is_from_me, m.is_read, \
           COALESCE(m.handle_id, 0) \
    FROM message m \
    LEFT JOIN handle h ON m.handle_id = h.ROWID \
    ORDER BY m.date ASC";

/// Read every message from an iOS native store, oldest first
///
/// The database is opened read-only; it is never modified.
pub fn read_native_store(path: &Path) -> Result<Vec<SmsEntry>> {
    if !path.exists() {
        return Err(TransferError::IoError(format!(
            "Message store not found: {}",
            path.display()
        )));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    let mut stmt = conn.prepare(NATIVE_QUERY)?;
    let rows = stmt.query_map([], |row| {
        let from_me: i64 = row.get::<_, Option<i64>>(3)?.unwrap_or(0);
        let is_read: i64 = row.get::<_, Option<i64>>(4)?.unwrap_or(0);
        Ok(SmsEntry {
            address: row.get(0)?,
            body: row.get(1)?,
            timestamp_ms: native_to_unix_ms(row.get::<_, Option<i64>>(2)?.unwrap_or(0)),
            direction: if from_me != 0 {
                Direction::Outbound
            } else {
                Direction::Inbound
            },
            read: is_read != 0,
            thread_id: row.get(5)?,
        })
    })?;

    let entries = rows.collect::<std::result::Result<Vec<_>, _>>()?;
    debug!(
        "Read {} message(s) from native store {}",
        entries.len(),
        path.display()
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_timestamp_conversion() {
        assert_eq!(native_to_unix_ms(700_000_000), 1_678_307_200_000);
    }

    #[test]
    fn test_out_of_range_timestamps_saturate() {
        assert_eq!(native_to_unix_ms(i64::MIN), i64::MIN);
        assert_eq!(native_to_unix_ms(-9_000_000_000_000_000), i64::MIN);
        assert_eq!(unix_ms_to_native_nanos(i64::MAX), i64::MAX);
        assert_eq!(unix_ms_to_native_nanos(i64::MIN), i64::MIN);
    }

    #[test]
    fn test_nanosecond_timestamp_conversion() {
        let nanos = 700_000_000_123_456_789;
        assert_eq!(native_to_unix_ms(nanos), 1_678_307_200_123);
    }

    #[test]
    fn test_epoch_roundtrip_within_one_ms() {
        for unix_ms in [
            978_307_200_000_i64,
            1_500_000_000_001,
            1_678_307_200_999,
            1_700_000_000_500,
        ] {
            let via_nanos = native_to_unix_ms(unix_ms_to_native_nanos(unix_ms));
            assert!((via_nanos - unix_ms).abs() <= 1, "nanos {}", unix_ms);
        }

        // The seconds layer drops sub-second precision by construction
        let secs = unix_ms_to_native_seconds(1_678_307_200_000);
        assert_eq!(secs, 700_000_000);
        assert_eq!(native_to_unix_ms(secs), 1_678_307_200_000);
    }

    #[test]
    fn test_json_uses_string_typed_keys() {
        let entries = vec![SmsEntry {
            address: "+5511999990000".into(),
            body: "Oi!".into(),
            timestamp_ms: 1_700_000_000_000,
            direction: Direction::Outbound,
            read: true,
            thread_id: 4,
        }];
        let json = write_messages_json(&entries).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let obj = &value[0];
        assert_eq!(obj["address"], "+5511999990000");
        assert_eq!(obj["date"], "1700000000000");
        assert_eq!(obj["type"], "2");
        assert_eq!(obj["read"], "1");
        assert_eq!(obj["thread_id"], "4");

        assert_eq!(parse_messages_json(&json), entries);
    }

    #[test]
    fn test_json_accepts_numbers() {
        let parsed = parse_messages_json(
            r#"[{"address":"123","body":"x","date":1700000000000,"type":1,"read":0,"thread_id":9}]"#,
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].timestamp_ms, 1_700_000_000_000);
        assert_eq!(parsed[0].direction, Direction::Inbound);
        assert!(!parsed[0].read);
        assert_eq!(parsed[0].thread_id, 9);
    }

    #[test]
    fn test_json_garbage_is_empty() {
        assert!(parse_messages_json("not json").is_empty());
        assert!(parse_messages_json("{}").is_empty());
    }

    fn build_store(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE handle (ROWID INTEGER PRIMARY KEY, id TEXT);
             CREATE TABLE message (ROWID INTEGER PRIMARY KEY, text TEXT, date INTEGER,
                                   is_from_me INTEGER, is_read INTEGER, handle_id INTEGER);
             INSERT INTO handle (ROWID, id) VALUES (1, '+5511988887777');
             INSERT INTO message (text, date, is_from_me, is_read, handle_id)
                 VALUES ('depois', 700000100000000000, 1, 1, 1);
             INSERT INTO message (text, date, is_from_me, is_read, handle_id)
                 VALUES ('antes', 700000000, 0, 0, 1);
             INSERT INTO message (text, date, is_from_me, is_read, handle_id)
                 VALUES (NULL, 700000050, 0, 1, 7);",
        )
        .unwrap();
    }

    #[test]
    fn test_read_native_store_orders_and_converts() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("sms.db");
        build_store(&db);

        let entries = read_native_store(&db).unwrap();
        assert_eq!(entries.len(), 3);

        // Sorted by raw native value: seconds rows sort before nanosecond rows
        assert_eq!(entries[0].body, "antes");
        assert_eq!(entries[0].timestamp_ms, 1_678_307_200_000);
        assert_eq!(entries[0].address, "+5511988887777");
        assert_eq!(entries[0].direction, Direction::Inbound);

        assert_eq!(entries[1].body, "");
        assert_eq!(entries[1].address, "");
        assert_eq!(entries[1].thread_id, 7);

        assert_eq!(entries[2].body, "depois");
        assert_eq!(entries[2].timestamp_ms, 1_678_307_300_000);
        assert_eq!(entries[2].direction, Direction::Outbound);
        assert!(entries[2].read);
    }

    #[test]
    fn test_read_native_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.db");
        assert!(read_native_store(&missing).is_err());
    }
}
