//! Push payload normalization
//!
//! The remote side has delivered the same topic in three shapes over time:
//! the bare value, `{ "data": value }`, and `[value]`. Everything past this
//! module only ever sees the bare value.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PayloadError;
use crate::protocol::Topic;

/// Decodes a push payload, trying the bare value, then the `data` envelope,
/// then a single-element array.
pub fn decode_payload<T: DeserializeOwned>(topic: Topic, payload: Value) -> Result<T, PayloadError> {
    let bare_error = match serde_json::from_value::<T>(payload.clone()) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let inner = match payload {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => map.remove("data"),
        Value::Array(mut items) if items.len() == 1 => items.pop(),
        _ => None,
    };

    match inner {
        Some(inner) => serde_json::from_value(inner).map_err(|e| PayloadError::Malformed {
            topic,
            reason: e.to_string(),
        }),
        None => Err(PayloadError::Malformed {
            topic,
            reason: bare_error.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BannedClient, ServerStatus};
    use serde_json::json;

    fn status_json() -> Value {
        json!({
            "http": { "IsRunning": true, "Error": "" },
            "voice": { "IsRunning": false, "Error": "" },
            "control": { "IsRunning": false, "Error": "bind failed" },
        })
    }

    #[test]
    fn test_bare_payload() {
        let status: ServerStatus = decode_payload(Topic::Status, status_json()).unwrap();
        assert!(status.http.is_running);
        assert_eq!(status.control.error, "bind failed");
    }

    #[test]
    fn test_data_envelope() {
        let payload = json!({ "data": status_json() });
        let status: ServerStatus = decode_payload(Topic::Status, payload).unwrap();
        assert!(status.http.is_running);
    }

    #[test]
    fn test_array_envelope() {
        let bans = json!([[{ "id": "1", "name": "Viper", "ip_address": "10.0.0.2", "reason": "spam" }]]);
        let bans: Vec<BannedClient> = decode_payload(Topic::Bans, bans).unwrap();
        assert_eq!(bans.len(), 1);
        assert_eq!(bans[0].name, "Viper");
    }

    #[test]
    fn test_empty_list_is_bare() {
        let bans: Vec<BannedClient> = decode_payload(Topic::Bans, json!([])).unwrap();
        assert!(bans.is_empty());
    }

    #[test]
    fn test_malformed_payload() {
        let result = decode_payload::<ServerStatus>(Topic::Status, json!({ "http": 3 }));
        match result {
            Err(PayloadError::Malformed { topic, .. }) => assert_eq!(topic, Topic::Status),
            Ok(_) => panic!("malformed payload decoded"),
        }
    }

    #[test]
    fn test_malformed_inside_envelope() {
        let result = decode_payload::<ServerStatus>(Topic::Status, json!({ "data": "nope" }));
        assert!(result.is_err());
    }
}
