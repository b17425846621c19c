use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Format of the capture timestamp stamped into every stored record.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Error building a stored record from a fetched payload.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("failed to serialize record to JSON")]
    Serialize(#[source] serde_json::Error),
}

/// Which of the two per-city payloads an object holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Current,
    Forecast,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Current => "current",
            DataKind::Forecast => "forecast",
        }
    }

    /// Object name for one city's payload: `{city}_{kind}`.
    ///
    /// The city text goes in verbatim (spaces included), so the name is
    /// deterministic from (city, kind) and repeated runs overwrite the
    /// same object.
    pub fn object_name(&self, city: &str) -> String {
        format!("{city}_{}", self.as_str())
    }
}

/// A fetched payload plus its capture timestamp, ready for upload.
///
/// Stamping produces a new value; the caller's payload is left untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StoredRecord {
    fields: Map<String, Value>,
}

impl StoredRecord {
    /// Copy the payload's top-level fields and add `timestamp`, the capture
    /// time formatted as `YYYYMMDD-HHMMSS` local time. An existing
    /// `timestamp` field is replaced.
    pub fn stamp(payload: &Value, taken_at: DateTime<Local>) -> Result<Self, RecordError> {
        let Value::Object(fields) = payload else {
            return Err(RecordError::NotAnObject);
        };

        let mut fields = fields.clone();
        fields.insert(
            "timestamp".to_string(),
            Value::String(taken_at.format(TIMESTAMP_FORMAT).to_string()),
        );

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The JSON text uploaded to storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        serde_json::to_vec(self).map_err(RecordError::Serialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone};
    use serde_json::json;

    fn capture_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, 3, 4, 5).unwrap()
    }

    #[test]
    fn stamp_keeps_all_fields_and_adds_timestamp() {
        let payload = json!({"name": "Seattle", "main": {"temp": 50.0}});

        let record = StoredRecord::stamp(&payload, capture_time()).unwrap();

        assert_eq!(record.fields()["name"], json!("Seattle"));
        assert_eq!(record.fields()["main"], json!({"temp": 50.0}));
        assert_eq!(record.fields()["timestamp"], json!("20240101-030405"));
    }

    #[test]
    fn stamped_timestamp_parses_back_with_the_same_format() {
        let payload = json!({"name": "Seattle"});

        let record = StoredRecord::stamp(&payload, capture_time()).unwrap();

        let stamp = record.fields()["timestamp"].as_str().unwrap();
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
            .expect("timestamp must match YYYYMMDD-HHMMSS");
    }

    #[test]
    fn stamp_leaves_the_payload_untouched() {
        let payload = json!({"name": "Seattle"});
        let before = payload.clone();

        StoredRecord::stamp(&payload, capture_time()).unwrap();

        assert_eq!(payload, before);
    }

    #[test]
    fn stamp_replaces_an_existing_timestamp_field() {
        let payload = json!({"timestamp": "stale"});

        let record = StoredRecord::stamp(&payload, capture_time()).unwrap();

        assert_eq!(record.fields()["timestamp"], json!("20240101-030405"));
    }

    #[test]
    fn stamp_rejects_non_object_payloads() {
        let err = StoredRecord::stamp(&json!([1, 2, 3]), capture_time()).unwrap_err();

        assert!(matches!(err, RecordError::NotAnObject));
    }

    #[test]
    fn record_bytes_parse_back_to_the_same_fields() {
        let payload = json!({"name": "Seattle", "cod": 200});

        let record = StoredRecord::stamp(&payload, capture_time()).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&record.to_bytes().unwrap()).unwrap();

        assert_eq!(parsed["name"], json!("Seattle"));
        assert_eq!(parsed["cod"], json!(200));
        assert_eq!(parsed["timestamp"], json!("20240101-030405"));
    }

    #[test]
    fn object_names_are_deterministic_from_city_and_kind() {
        assert_eq!(DataKind::Current.object_name("Seattle"), "Seattle_current");
        assert_eq!(DataKind::Forecast.object_name("Seattle"), "Seattle_forecast");
        // City names go in verbatim, spaces included.
        assert_eq!(DataKind::Current.object_name("New York"), "New York_current");
    }
}
