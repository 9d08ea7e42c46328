//! The untyped object tree shared by every parser and the unparser.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered string-keyed mapping. Iteration order is insertion
/// order; the unparser is responsible for any further canonicalization
/// (see `ascii::unparser`).
pub type Mapping = IndexMap<String, Value>;

/// A string scalar, with an advisory record of whether the source text
/// was quoted. The unparser never consults `was_quoted` — it always
/// re-derives quoting from the string's own shape — but parsers
/// populate it because some diagnostic and lint tooling finds it
/// useful to know how a value was originally written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringValue {
    pub text: String,
    pub was_quoted: bool,
}

impl StringValue {
    pub fn new(text: impl Into<String>, was_quoted: bool) -> Self {
        Self { text: text.into(), was_quoted }
    }

    pub fn unquoted(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for StringValue {
    fn from(s: &str) -> Self {
        Self::unquoted(s)
    }
}

impl From<String> for StringValue {
    fn from(s: String) -> Self {
        Self::unquoted(s)
    }
}

/// The recursive value tree produced by every parser and consumed by
/// every writer in this crate.
///
/// All scalars are strings: the ASCII plist dialect has no numeric or
/// boolean literal, so integers, reals, and (where present in XML
/// input) booleans are all represented as their canonical decimal /
/// `true`/`false` text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(StringValue),
    Mapping(Mapping),
    Sequence(Vec<Value>),
    Data(Vec<u8>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(StringValue::unquoted(s))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&s.text),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

/// Converts a `Value` into a `serde_json::Value`, used by the JSON
/// front-end and the "fast" ASCII parser's rewrite-to-JSON path.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::String(s) => serializer.serialize_str(&s.text),
            Value::Mapping(m) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Sequence(seq) => {
                use serde::ser::SerializeSeq;
                let mut s = serializer.serialize_seq(Some(seq.len()))?;
                for v in seq {
                    s.serialize_element(v)?;
                }
                s.end()
            }
            Value::Data(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                serializer.serialize_str(&hex)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> serde::de::Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a plist value (string, mapping, or sequence)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Value, E> {
                Ok(Value::string(v))
            }

            fn visit_string<E>(self, v: String) -> Result<Value, E> {
                Ok(Value::string(v))
            }

            fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
                Ok(Value::string(if v { "true" } else { "false" }))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
                Ok(Value::string(v.to_string()))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
                Ok(Value::string(v.to_string()))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
                Ok(Value::string(v.to_string()))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = Vec::new();
                while let Some(v) = seq.next_element()? {
                    out.push(v);
                }
                Ok(Value::Sequence(out))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut out = Mapping::new();
                while let Some((k, v)) = map.next_entry::<String, Value>()? {
                    out.insert(k, v);
                }
                Ok(Value::Mapping(out))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
