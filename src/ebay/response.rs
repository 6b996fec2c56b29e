//! Response decoding: padding removal, validation and envelope stripping.

use crate::ebay::models::Response;
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Provider metadata removed from every response before delivery.
pub const ENVELOPE_FIELDS: [&str; 4] = ["Ack", "Build", "Version", "Timestamp"];

/// Removes exactly the envelope fields, leaving everything else untouched
/// and in its original order.
pub fn normalize(raw: Map<String, Value>) -> Response {
    let fields: Map<String, Value> =
        raw.into_iter().filter(|(key, _)| !ENVELOPE_FIELDS.contains(&key.as_str())).collect();
    Response::new(fields)
}

/// Strips `callback( ... )` padding, returning the inner payload.
///
/// Accepts surrounding whitespace and a trailing semicolon. Returns `None` if
/// the body is not padded with exactly `callback`.
pub fn unwrap_padding<'a>(body: &'a str, callback: &str) -> Option<&'a str> {
    let body = body.trim();
    let body = body.strip_suffix(';').unwrap_or(body).trim_end();
    let inner = body.strip_prefix(callback)?.trim_start();
    inner.strip_prefix('(')?.strip_suffix(')')
}

/// Parses a body into a JSON object, rejecting empty or non-object payloads.
pub fn parse_object(id: &str, body: &str) -> Result<Map<String, Value>> {
    let malformed = |reason: String| Error::MalformedResponse { id: id.to_string(), reason };

    if body.trim().is_empty() {
        return Err(malformed("empty body".to_string()));
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;

    match value {
        Value::Object(fields) if fields.is_empty() => Err(malformed("empty object".to_string())),
        Value::Object(fields) => Ok(fields),
        other => Err(malformed(format!("expected a JSON object, got {}", kind(&other)))),
    }
}

/// Fails with [`Error::ApiFailure`] when the call was acknowledged as a failure.
pub fn check_ack(id: &str, fields: &Map<String, Value>) -> Result<()> {
    match fields.get("Ack").and_then(Value::as_str) {
        Some("Failure") => Err(Error::ApiFailure { id: id.to_string(), message: error_message(fields) }),
        _ => Ok(()),
    }
}

/// Full decoding pipeline for one HTTP body.
///
/// With a `callback`, the body must be padded with it.
pub fn decode(id: &str, body: &str, callback: Option<&str>) -> Result<Response> {
    let payload = match callback {
        Some(callback) => unwrap_padding(body, callback).ok_or_else(|| Error::MalformedResponse {
            id: id.to_string(),
            reason: format!("expected payload padded with {}(...)", callback),
        })?,
        None => body,
    };

    let fields = parse_object(id, payload)?;
    check_ack(id, &fields)?;
    Ok(normalize(fields))
}

fn error_message(fields: &Map<String, Value>) -> String {
    let first = match fields.get("Errors") {
        Some(Value::Array(errors)) => errors.first(),
        Some(error @ Value::Object(_)) => Some(error),
        _ => None,
    };

    first
        .and_then(|error| {
            error
                .get("LongMessage")
                .or_else(|| error.get("ShortMessage"))
                .and_then(Value::as_str)
        })
        .unwrap_or("call acknowledged as Failure")
        .to_string()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
