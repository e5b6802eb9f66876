//! Rejection message extraction from error response bodies.

use serde_json::Value;

/// Pull a user-displayable message out of an error response body.
///
/// Accepts a JSON string, `{"message": ..}`, `{"error": {"message": ..}}`,
/// `{"error": ".."}` or `{"data": ..}`; anything that is not JSON is used as
/// plain text. Returns `None` for blank bodies.
#[must_use]
pub fn extract_rejection_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(payload) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };

    payload
        .as_str()
        .or_else(|| payload.pointer("/message").and_then(Value::as_str))
        .or_else(|| payload.pointer("/error/message").and_then(Value::as_str))
        .or_else(|| payload.pointer("/error").and_then(Value::as_str))
        .or_else(|| payload.pointer("/data").and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}
