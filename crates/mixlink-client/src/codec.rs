//! Wire codec for the daemon's text frames.
//!
//! Inbound frames carry either a full `Status` snapshot or a flat `Patch`
//! list under `data`; anything else structurally valid (command
//! acknowledgements and the like) decodes to "not for us" rather than an
//! error. Outbound frames are envelopes with a request id and either the
//! bare-string `GetStatus` request or a `Command` addressed to a device.

use serde::Serialize;
use serde_json::{Map, Value};

use mixlink_core::Patch;

use crate::error::CodecError;

/// Outbound frame envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Monotonically increasing request id. A protocol requirement of the
    /// daemon; responses are never correlated back to it.
    pub id: u64,
    /// The request payload
    pub data: OutboundPayload,
}

/// Payload of an outbound frame.
///
/// External tagging gives the protocol's asymmetric shapes directly:
/// `GetStatus` serializes as the bare string `"GetStatus"`, while
/// `Command(serial, body)` serializes as `{"Command":[serial, body]}`.
#[derive(Debug, Clone, Serialize)]
pub enum OutboundPayload {
    /// Request a full state snapshot; the first frame on every connection
    GetStatus,
    /// A named command addressed to a device serial
    Command(String, Value),
}

/// A decoded inbound frame the client acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Full state snapshot; device serials are the keys of its `mixers` map
    Status(Map<String, Value>),
    /// Incremental diffs, already flat
    Patches(Vec<Patch>),
}

/// Decode a raw inbound text frame.
///
/// Returns `Ok(None)` for structurally valid frames that carry neither a
/// snapshot nor a patch list.
///
/// # Errors
/// Returns an error for unparsable JSON, a frame without a `data` field, or
/// a patch list whose entries do not match the patch vocabulary.
pub fn decode(text: &str) -> Result<Option<Inbound>, CodecError> {
    let frame: Value = serde_json::from_str(text)?;
    let Value::Object(mut frame) = frame else {
        return Err(CodecError::NotAnObject);
    };
    let data = frame.shift_remove("data").ok_or(CodecError::MissingData)?;
    let Value::Object(mut data) = data else {
        // Bare-string payloads ("Ok", error text) are acknowledgements.
        return Ok(None);
    };

    if let Some(Value::Object(status)) = data.shift_remove("Status") {
        return Ok(Some(Inbound::Status(status)));
    }
    if let Some(patches) = data.shift_remove("Patch") {
        // A present-but-malformed patch list is a decode failure, not an
        // ignorable frame; from_value rejects non-arrays as well as bad ops.
        let patches = serde_json::from_value(patches).map_err(CodecError::MalformedPatch)?;
        return Ok(Some(Inbound::Patches(patches)));
    }

    Ok(None)
}

/// Serialize an outbound envelope to its wire form.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn encode(envelope: &Envelope) -> Result<String, CodecError> {
    Ok(serde_json::to_string(envelope)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixlink_core::PatchOp;
    use serde_json::json;

    #[test]
    fn test_decode_status_frame() {
        let text = json!({
            "id": 1,
            "data": {"Status": {"mixers": {"SN1": {"muted": false}}}}
        })
        .to_string();

        let Some(Inbound::Status(status)) = decode(&text).unwrap() else {
            panic!("expected a status frame");
        };
        assert_eq!(status.get("mixers"), Some(&json!({"SN1": {"muted": false}})));
    }

    #[test]
    fn test_decode_patch_frame() {
        let text = json!({
            "id": 2,
            "data": {"Patch": [
                {"op": "replace", "path": "/mixers/SN1/muted", "value": true},
                {"op": "remove", "path": "/mixers/SN1/banks/0"}
            ]}
        })
        .to_string();

        let Some(Inbound::Patches(patches)) = decode(&text).unwrap() else {
            panic!("expected a patch frame");
        };
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].op, PatchOp::Replace);
        assert_eq!(patches[1].op, PatchOp::Remove);
        assert_eq!(patches[1].path, "/mixers/SN1/banks/0");
    }

    #[test]
    fn test_decode_acknowledgement_is_not_for_us() {
        assert_eq!(decode(r#"{"id":3,"data":"Ok"}"#).unwrap(), None);
        assert_eq!(decode(r#"{"id":4,"data":{"Error":"no such command"}}"#).unwrap(), None);
    }

    #[test]
    fn test_decode_missing_data_is_an_error() {
        assert!(matches!(decode(r#"{"id":5}"#), Err(CodecError::MissingData)));
    }

    #[test]
    fn test_decode_non_object_frame_is_an_error() {
        assert!(matches!(decode(r#""hello""#), Err(CodecError::NotAnObject)));
        assert!(matches!(decode("not json at all"), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_decode_unknown_op_fails_that_frame_only() {
        let text = json!({
            "id": 6,
            "data": {"Patch": [{"op": "move", "path": "/a", "value": 1}]}
        })
        .to_string();

        assert!(matches!(decode(&text), Err(CodecError::MalformedPatch(_))));
    }

    #[test]
    fn test_decode_non_array_patch_list_is_an_error() {
        let text = json!({"id": 8, "data": {"Patch": "garbage"}}).to_string();
        assert!(matches!(decode(&text), Err(CodecError::MalformedPatch(_))));
    }

    #[test]
    fn test_encode_get_status_is_a_bare_string_payload() {
        let envelope = Envelope { id: 0, data: OutboundPayload::GetStatus };
        assert_eq!(encode(&envelope).unwrap(), r#"{"id":0,"data":"GetStatus"}"#);
    }

    #[test]
    fn test_encode_command_envelope() {
        let envelope = Envelope {
            id: 7,
            data: OutboundPayload::Command(
                "SN1".to_string(),
                json!({"SetVolume": ["Mic", 200]}),
            ),
        };

        let encoded: Value = serde_json::from_str(&encode(&envelope).unwrap()).unwrap();
        assert_eq!(
            encoded,
            json!({"id": 7, "data": {"Command": ["SN1", {"SetVolume": ["Mic", 200]}]}})
        );
    }
}
