//! Thin `serde_json` front-end: converts between our `Value` tree and
//! JSON text.

use crate::error::ParseErrorKind;
use crate::value::Value;

/// Parses `src` as JSON text into a `Value` tree. JSON numbers and
/// booleans are converted to their canonical string form, matching
/// the ASCII-plist string-only scalar model.
pub fn parse(src: &[u8]) -> Result<Value, ParseErrorKind> {
    serde_json::from_slice(src).map_err(|e| ParseErrorKind::JsonSyntax { message: e.to_string() })
}

/// Serializes `value` as pretty-printed JSON text (two-space indent,
/// matching `serde_json::to_string_pretty`'s default).
pub fn write(value: &Value) -> String {
    serde_json::to_string_pretty(value).expect("Value serialization is infallible")
}
