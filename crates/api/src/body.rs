//! Lenient JSON body parsing for the review endpoints.
//!
//! Browser clients send numbers as either JSON numbers or numeric strings,
//! and sometimes post an empty body. Handlers read raw bytes and go through
//! these helpers so every malformed body maps to a 400.

use serde_json::{Map, Value};

use crate::error::AppError;

/// Parse a request body, returning `None` for an empty or whitespace-only body.
pub fn parse_optional_json(bytes: &[u8]) -> Result<Option<Value>, AppError> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))
}

/// A field was present but not a usable number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidNumber;

/// Read an integer that may be a JSON number or a numeric string.
///
/// Returns `Ok(None)` when the field is missing or `null`, and
/// [`InvalidNumber`] when it is present but not an integer.
pub fn lenient_i64(value: Option<&Value>) -> Result<Option<i64>, InvalidNumber> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| Some(f as i64))
                .ok_or(InvalidNumber),
        },
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| InvalidNumber),
        Some(_) => Err(InvalidNumber),
    }
}

/// Read a float that may be a JSON number or a numeric string.
pub fn lenient_f64(value: Option<&Value>) -> Result<Option<f64>, InvalidNumber> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(InvalidNumber),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or(InvalidNumber),
        Some(_) => Err(InvalidNumber),
    }
}

/// Textual form of a field: strings as-is, `null`/missing as empty, anything
/// else in its JSON form.
pub fn text_field(object: &Map<String, Value>, name: &str) -> String {
    match object.get(name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
