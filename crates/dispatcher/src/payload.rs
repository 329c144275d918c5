//! Outbound payload shape
//!
//! `{"event":{"payloadData":{<name>:<value>,...}}}`. Artifact payloads carry a
//! `timestamp` (epoch seconds, taken at fire time); an event field named
//! `timestamp` overrides it.

use bytes::Bytes;
use contracts::{EntityKind, StreamEvent};
use serde_json::{json, Map, Value};

use crate::error::DispatcherError;

/// Field injected into artifact payloads
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Current wall-clock time in epoch seconds
pub fn fire_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Build the `payloadData` object; duplicate names keep the last value
pub fn payload_data(kind: EntityKind, event: &StreamEvent, fired_at: i64) -> Map<String, Value> {
    let mut data = Map::new();

    if kind == EntityKind::Artifact {
        data.insert(TIMESTAMP_FIELD.to_string(), Value::from(fired_at));
    }

    for (name, value) in &event.fields {
        data.insert(name.clone(), Value::String(value.clone()));
    }

    data
}

/// Build the full payload document
pub fn build_payload(kind: EntityKind, event: &StreamEvent, fired_at: i64) -> Value {
    json!({ "event": { "payloadData": payload_data(kind, event, fired_at) } })
}

/// Serialize a payload for the wire
pub fn encode_payload(entity: &str, payload: &Value) -> Result<Bytes, DispatcherError> {
    serde_json::to_vec(payload)
        .map(Bytes::from)
        .map_err(|source| DispatcherError::PayloadEncoding {
            entity: entity.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> StreamEvent {
        StreamEvent::new(
            10,
            vec![
                ("temp".to_string(), "5".to_string()),
                ("humidity".to_string(), "60".to_string()),
            ],
        )
    }

    #[test]
    fn test_artifact_payload_has_timestamp() {
        let payload = build_payload(EntityKind::Artifact, &event(), 1_700_000_000);
        let data = &payload["event"]["payloadData"];

        assert_eq!(data["temp"], "5");
        assert_eq!(data["humidity"], "60");
        assert_eq!(data["timestamp"], 1_700_000_000);
        assert_eq!(data.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_stakeholder_payload_has_no_timestamp() {
        let payload = build_payload(EntityKind::Stakeholder, &event(), 1_700_000_000);
        let data = payload["event"]["payloadData"].as_object().unwrap();

        assert!(!data.contains_key("timestamp"));
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let event = StreamEvent::new(
            0,
            vec![
                ("state".to_string(), "a".to_string()),
                ("state".to_string(), "b".to_string()),
            ],
        );
        let data = payload_data(EntityKind::Stakeholder, &event, 0);
        assert_eq!(data["state"], "b");
    }

    #[test]
    fn test_event_field_overrides_timestamp() {
        let event = StreamEvent::new(0, vec![("timestamp".to_string(), "42".to_string())]);
        let data = payload_data(EntityKind::Artifact, &event, 1_700_000_000);
        assert_eq!(data["timestamp"], "42");
    }

    #[test]
    fn test_encode_payload() {
        let event = StreamEvent::new(0, vec![("a".to_string(), "1".to_string())]);
        let bytes = encode_payload("Carrier/I1", &build_payload(EntityKind::Stakeholder, &event, 0))
            .unwrap();
        assert_eq!(&bytes[..], br#"{"event":{"payloadData":{"a":"1"}}}"#);
    }

    #[test]
    fn test_fire_timestamp_is_current() {
        let before = chrono::Utc::now().timestamp();
        let ts = fire_timestamp();
        assert!(ts >= before && ts <= before + 1);
    }
}
