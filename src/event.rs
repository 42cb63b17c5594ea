//! S3 upload notification handling
//!
//! The inbound payload is kept as a raw [`serde_json::Value`] so that a
//! malformed event can be logged verbatim and answered with a 400 instead of
//! failing deserialization inside the runtime.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Top-level field holding the notification records.
pub const RECORDS: &str = "Records";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEvent {
    #[error("event has no `Records` array")]
    MissingRecords,
    #[error("event `Records` array is empty")]
    NoRecords,
    #[error("first record is malformed: {0}")]
    MalformedRecord(String),
    #[error("object key is not valid UTF-8 once decoded: {0}")]
    KeyEncoding(String),
}

#[derive(Deserialize)]
struct Record {
    s3: S3Entity,
}

#[derive(Deserialize)]
struct S3Entity {
    #[serde(default)]
    bucket: Option<Bucket>,
    object: Object,
}

#[derive(Deserialize)]
struct Bucket {
    name: String,
}

#[derive(Deserialize)]
struct Object {
    key: String,
}

/// The object named by an upload notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// Bucket as reported by the event. Retrieval uses the configured bucket.
    pub bucket: Option<String>,
    /// Decoded object key.
    pub key: String,
}

/// Extracts the object of the first record. Further records are ignored.
pub fn first_object(event: &Value) -> Result<ObjectRef, InvalidEvent> {
    let records = event
        .get(RECORDS)
        .and_then(Value::as_array)
        .ok_or(InvalidEvent::MissingRecords)?;
    let (first, rest) = records.split_first().ok_or(InvalidEvent::NoRecords)?;
    if !rest.is_empty() {
        warn!(ignored = rest.len(), "Only the first record is processed");
    }
    let record = Record::deserialize(first)
        .map_err(|error| InvalidEvent::MalformedRecord(error.to_string()))?;
    Ok(ObjectRef {
        bucket: record.s3.bucket.map(|bucket| bucket.name),
        key: decode_key(&record.s3.object.key)?,
    })
}

/// S3 notifications carry keys form-encoded: `+` for space, `%XX` otherwise.
pub fn decode_key(raw: &str) -> Result<String, InvalidEvent> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|key| key.into_owned())
        .map_err(|error| InvalidEvent::KeyEncoding(error.to_string()))
}
