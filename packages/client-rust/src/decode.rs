//! Error-body decoding for non-success responses.

use tracing::debug;

use crate::error::{ApiError, ErrorPayload};

/// Longest slice of an undecodable body kept in the error message.
const MAX_RAW_MESSAGE_CHARS: usize = 512;

/// Turns a non-success status and its body into an [`ApiError`].
pub trait ErrorDecoder: Send + Sync {
    fn decode(&self, status: u16, reason: &str, body: &[u8]) -> ApiError;
}

/// Decodes JSON error bodies into [`ErrorPayload`].
///
/// - empty body: status code and reason phrase only
/// - JSON body: structured payload; its message (top-level, else a nested
///   exception's) wins over the reason phrase
/// - anything else: the body text (truncated) becomes the message
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorDecoder;

impl ErrorDecoder for JsonErrorDecoder {
    fn decode(&self, status: u16, reason: &str, body: &[u8]) -> ApiError {
        if body.iter().all(u8::is_ascii_whitespace) {
            return ApiError::from_status(status, reason);
        }
        match serde_json::from_slice::<ErrorPayload>(body) {
            Ok(payload) => ApiError {
                status,
                message: payload.description().unwrap_or(reason).to_string(),
                payload: Some(payload),
            },
            Err(err) => {
                debug!(status, error = %err, "error body is not a structured payload");
                let text = String::from_utf8_lossy(body);
                ApiError::from_status(
                    status,
                    text.trim().chars().take(MAX_RAW_MESSAGE_CHARS).collect::<String>(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_body_uses_status_line() {
        let err = JsonErrorDecoder.decode(404, "Not Found", b"");
        assert_eq!(err, ApiError::from_status(404, "Not Found"));
    }

    #[test]
    fn whitespace_body_counts_as_empty() {
        let err = JsonErrorDecoder.decode(500, "Internal Server Error", b" \n");
        assert!(err.payload.is_none());
        assert_eq!(err.message, "Internal Server Error");
    }

    #[test]
    fn json_body_becomes_structured_payload() {
        let body = br#"{"entity-type":"exception","status":403,"code":"Forbidden","message":"no read access"}"#;
        let err = JsonErrorDecoder.decode(403, "Forbidden", body);
        assert_eq!(err.status, 403);
        assert_eq!(err.message, "no read access");
        assert_eq!(err.code(), Some("Forbidden"));
    }

    #[test]
    fn json_body_without_message_falls_back_to_reason() {
        let err = JsonErrorDecoder.decode(400, "Bad Request", br#"{"code":"Invalid"}"#);
        assert_eq!(err.message, "Bad Request");
        assert_eq!(err.code(), Some("Invalid"));
    }

    #[test]
    fn body_with_code_and_type_stays_structured() {
        let err = JsonErrorDecoder.decode(409, "Conflict", br#"{"code":"A","type":"B","message":"m"}"#);
        let payload = err.payload.as_ref().unwrap();
        assert_eq!(payload.error_type.as_deref(), Some("B"));
        assert_eq!(err.code(), Some("A"));
        assert_eq!(err.message, "m");
    }

    #[test]
    fn nested_exception_object_stays_structured() {
        let body = br#"{"type":"ServerError","exception":{"class":"org.example.StorageException","message":"disk full"}}"#;
        let err = JsonErrorDecoder.decode(500, "Internal Server Error", body);
        assert!(err.payload.is_some());
        assert_eq!(err.code(), Some("ServerError"));
        assert_eq!(err.message, "disk full");
    }

    #[test]
    fn non_json_body_is_kept_as_text() {
        let err = JsonErrorDecoder.decode(502, "Bad Gateway", b"<html>upstream down</html>");
        assert!(err.payload.is_none());
        assert_eq!(err.message, "<html>upstream down</html>");
    }

    #[test]
    fn long_text_body_is_truncated() {
        let body = "x".repeat(2_000);
        let err = JsonErrorDecoder.decode(500, "Internal Server Error", body.as_bytes());
        assert_eq!(err.message.len(), MAX_RAW_MESSAGE_CHARS);
    }

    proptest! {
        #[test]
        fn arbitrary_bodies_decode_without_panicking(
            status in 400u16..600,
            body in proptest::collection::vec(any::<u8>(), 0..2_048),
        ) {
            let err = JsonErrorDecoder.decode(status, "Reason", &body);
            prop_assert_eq!(err.status, status);
            if err.payload.is_none() {
                prop_assert!(err.message.chars().count() <= MAX_RAW_MESSAGE_CHARS);
            }
        }
    }
}
