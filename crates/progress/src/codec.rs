//! Text encoding of the progress snapshot.
//!
//! The same shape is used for durable storage and for user exports:
//!
//! ```json
//! {
//!   "records": { "<itemId>": { "completed": true, "completedAt": 1700000000000, "notes": "..." } },
//!   "lastUpdated": 1700000000000,
//!   "totalCompleted": 1
//! }
//! ```

use std::collections::BTreeMap;
use chrono::{TimeZone, Utc};
use learntrack_core::{CompletionRecord, ItemId, ProgressSnapshot, Time};
use serde_json::{Map, Value};
use tracing::warn;

/// Why a payload was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Not JSON at all
    #[error("not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// JSON, but not an object
    #[error("top-level value is not an object")]
    NotAnObject,

    /// No `records` field
    #[error("missing \"records\" field")]
    MissingRecords,

    /// `records` is present but not an object
    #[error("\"records\" is not an object")]
    RecordsNotAMap,

    /// One entry of `records` has the wrong shape
    #[error("record {id:?} is invalid: {source}")]
    InvalidRecord {
        /// Offending item id
        id: String,
        /// Decoding failure
        source: serde_json::Error,
    },
}

/// Layout a stored snapshot was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredFormat {
    /// Current record map layout
    Current,
    /// Early layout: a flat `completedProjects` id list
    Legacy,
}

/// Pretty-printed snapshot text. Records come out sorted by id.
pub fn encode(snapshot: &ProgressSnapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(snapshot)
}

/// Validate an import payload and return its records.
///
/// Only `records` is read. `totalCompleted` and `lastUpdated` are ignored;
/// the caller recounts and stamps the import time.
pub fn parse_import(text: &str) -> Result<BTreeMap<ItemId, CompletionRecord>, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(map) = value else {
        return Err(ImportError::NotAnObject);
    };
    records_from(map)
}

/// Decode the text found in durable storage.
///
/// Unlike an import, a stored snapshot keeps its `lastUpdated`. The legacy
/// id-list layout is migrated with every listed id completed at `now`.
pub fn decode_stored(text: &str, now: Time) -> Result<(ProgressSnapshot, StoredFormat), ImportError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(map) = value else {
        return Err(ImportError::NotAnObject);
    };

    if !map.contains_key("records") {
        if let Some(Value::Array(ids)) = map.get("completedProjects") {
            let records = ids
                .iter()
                .filter_map(Value::as_str)
                .map(|id| (ItemId::from(id), CompletionRecord::completed(now)))
                .collect();
            return Ok((ProgressSnapshot::from_records(records, now), StoredFormat::Legacy));
        }
    }

    let claimed = map.get("totalCompleted").and_then(Value::as_u64);
    let last_updated = map
        .get("lastUpdated")
        .and_then(Value::as_i64)
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or(now);

    let snapshot = ProgressSnapshot::restore(records_from(map)?, last_updated, now);
    if let Some(claimed) = claimed {
        if claimed != snapshot.total_completed() as u64 {
            warn!(
                stored = claimed,
                actual = snapshot.total_completed(),
                "stored completed count disagrees with records, using recount"
            );
        }
    }
    Ok((snapshot, StoredFormat::Current))
}

fn records_from(
    mut map: Map<String, Value>,
) -> Result<BTreeMap<ItemId, CompletionRecord>, ImportError> {
    let Value::Object(records) = map.remove("records").ok_or(ImportError::MissingRecords)? else {
        return Err(ImportError::RecordsNotAMap);
    };

    records
        .into_iter()
        .map(|(id, raw)| match serde_json::from_value::<CompletionRecord>(raw) {
            Ok(record) => Ok((ItemId::from(id), record)),
            Err(source) => Err(ImportError::InvalidRecord { id, source }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Time {
        Utc.timestamp_millis_opt(1_750_000_000_000).unwrap()
    }

    #[test]
    fn test_parse_import_rejections() {
        assert!(matches!(parse_import("not json"), Err(ImportError::Parse(_))));
        assert!(matches!(parse_import("[1, 2]"), Err(ImportError::NotAnObject)));
        assert!(matches!(parse_import(r#"{"foo": 1}"#), Err(ImportError::MissingRecords)));
        assert!(matches!(parse_import(r#"{"records": []}"#), Err(ImportError::RecordsNotAMap)));
        assert!(matches!(
            parse_import(r#"{"records": {"a": {"completed": "yes"}}}"#),
            Err(ImportError::InvalidRecord { ref id, .. }) if id == "a"
        ));
    }

    #[test]
    fn test_parse_import_accepts_minimal_records() {
        let records = parse_import(r#"{"records": {"a": {"completed": true}, "b": {"completed": false, "notes": "later"}}}"#)
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records["a"].completed);
        assert_eq!(records["b"].notes.as_deref(), Some("later"));
    }

    #[test]
    fn test_decode_stored_keeps_last_updated_and_recounts() {
        let text = r#"{
            "records": {
                "a": {"completed": true, "completedAt": 1700000000000},
                "b": {"completed": false}
            },
            "lastUpdated": 1700000000500,
            "totalCompleted": 7
        }"#;
        let (snapshot, format) = decode_stored(text, now()).unwrap();

        assert_eq!(format, StoredFormat::Current);
        assert_eq!(snapshot.total_completed(), 1);
        assert_eq!(snapshot.last_updated().timestamp_millis(), 1_700_000_000_500);
    }

    #[test]
    fn test_decode_stored_migrates_legacy_layout() {
        let text = r#"{
            "completedProjects": ["sql-agent", "rag-bot"],
            "totalCompleted": 2,
            "lastUpdated": "2025-01-15T10:00:00.000Z"
        }"#;
        let (snapshot, format) = decode_stored(text, now()).unwrap();

        assert_eq!(format, StoredFormat::Legacy);
        assert_eq!(snapshot.total_completed(), 2);
        assert!(snapshot.is_completed("rag-bot"));
        assert_eq!(snapshot.record("sql-agent").unwrap().completed_at, Some(now()));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let mut first = ProgressSnapshot::empty(now());
        first.toggle("b", now());
        first.toggle("a", now());
        let mut second = ProgressSnapshot::empty(now());
        second.toggle("a", now());
        second.toggle("b", now());

        let text = encode(&first).unwrap();
        assert_eq!(text, encode(&second).unwrap());
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
        assert!(text.contains('\n'));
    }
}
