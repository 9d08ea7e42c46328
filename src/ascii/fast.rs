//! Fast path: rewrite the ASCII plist dialect into strict JSON text
//! and delegate the actual parse to `serde_json`.
//!
//! Trades the classic parser's precise line/column errors for raw
//! throughput — useful for callers (like `--lint`) that only care
//! whether the input parses, not exactly where it broke.

use crate::ascii::token::{TokenKind, Tokenizer};
use crate::error::ParseErrorKind;
use crate::value::{Mapping, StringValue, Value};

enum Frame {
    // `expect_key` is true when the next scalar token is a dictionary
    // key rather than a value; it flips false after the key is
    // written and back to true once the entry's `;` is seen.
    Mapping { wrote_entry: bool, expect_key: bool },
    // `saw_separator` tracks whether an actual `,` token has been seen
    // since the last element, so a second element arriving without one
    // is rejected rather than silently comma-joined — Xcode requires a
    // separator between array elements (a trailing one is optional).
    Sequence { wrote_entry: bool, saw_separator: bool },
}

/// Rewrites `src` into a JSON text buffer. Comments are dropped,
/// dictionary `;` terminators become `,` separators, quoted strings
/// are re-escaped for JSON, and unquoted tokens are wrapped in `"`.
fn rewrite_to_json(src: &[u8]) -> Result<String, ParseErrorKind> {
    let mut tokenizer = Tokenizer::new(src);
    let mut out = String::with_capacity(src.len() + src.len() / 4);
    let mut stack: Vec<Frame> = Vec::new();

    // Comma insertion before a value-position token (container or
    // scalar value): only sequences need it here, since dictionary
    // commas are driven by `expect_key` below. Errors if a prior
    // element exists but no `,` token was actually seen since it.
    let comma_before_value = |out: &mut String, stack: &mut Vec<Frame>, offset: usize| {
        if let Some(Frame::Sequence { wrote_entry, saw_separator }) = stack.last_mut() {
            if *wrote_entry {
                if !*saw_separator {
                    return Err(missing_separator_err(src, offset));
                }
                out.push(',');
            }
            *wrote_entry = true;
            *saw_separator = false;
        }
        Ok(())
    };

    loop {
        let tok = tokenizer.next_token()?;
        match tok.kind {
            TokenKind::Eof => break,
            TokenKind::LBrace => {
                comma_before_value(&mut out, &mut stack, tok.offset)?;
                out.push('{');
                stack.push(Frame::Mapping { wrote_entry: false, expect_key: true });
            }
            TokenKind::RBrace => {
                stack.pop();
                out.push('}');
            }
            TokenKind::LParen => {
                comma_before_value(&mut out, &mut stack, tok.offset)?;
                out.push('[');
                stack.push(Frame::Sequence { wrote_entry: false, saw_separator: false });
            }
            TokenKind::RParen => {
                stack.pop();
                out.push(']');
            }
            TokenKind::Equals => out.push(':'),
            TokenKind::Semicolon => {
                if let Some(Frame::Mapping { wrote_entry, expect_key }) = stack.last_mut() {
                    *wrote_entry = true;
                    *expect_key = true;
                }
            }
            TokenKind::Comma => {
                if let Some(Frame::Sequence { saw_separator, .. }) = stack.last_mut() {
                    *saw_separator = true;
                }
            }
            TokenKind::Ident(s) => emit_scalar(&mut out, &mut stack, &s, src, tok.offset)?,
            TokenKind::QuotedString(s) => emit_scalar(&mut out, &mut stack, &s, src, tok.offset)?,
            TokenKind::Data(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                emit_scalar(&mut out, &mut stack, &hex, src, tok.offset)?;
            }
        }
    }

    Ok(out)
}

fn missing_separator_err(src: &[u8], offset: usize) -> ParseErrorKind {
    ParseErrorKind::ParseSyntax {
        message: "expected ',' between array elements".into(),
        location: crate::ascii::token::location_at(src, offset),
    }
}

fn emit_scalar(out: &mut String, stack: &mut [Frame], s: &str, src: &[u8], offset: usize) -> Result<(), ParseErrorKind> {
    match stack.last_mut() {
        Some(Frame::Mapping { wrote_entry, expect_key }) => {
            if *expect_key {
                if *wrote_entry {
                    out.push(',');
                }
                *expect_key = false;
            }
        }
        Some(Frame::Sequence { wrote_entry, saw_separator }) => {
            if *wrote_entry {
                if !*saw_separator {
                    return Err(missing_separator_err(src, offset));
                }
                out.push(',');
            }
            *wrote_entry = true;
            *saw_separator = false;
        }
        None => {}
    }
    out.push('"');
    out.push_str(&json_escape(s));
    out.push('"');
    Ok(())
}

fn json_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Parses `src` via the rewrite-to-JSON fast path.
pub fn parse(src: &[u8]) -> Result<Value, ParseErrorKind> {
    let json_text = rewrite_to_json(src)?;
    log::trace!("fast parser: rewrote {} input bytes to {} bytes of JSON", src.len(), json_text.len());
    let jv: serde_json::Value = serde_json::from_str(&json_text)
        .map_err(|e| ParseErrorKind::JsonSyntax { message: e.to_string() })?;
    Ok(json_to_value(jv))
}

fn json_to_value(jv: serde_json::Value) -> Value {
    match jv {
        serde_json::Value::Null => Value::String(StringValue::unquoted("")),
        serde_json::Value::Bool(b) => Value::String(StringValue::unquoted(if b { "true" } else { "false" })),
        serde_json::Value::Number(n) => Value::String(StringValue::unquoted(n.to_string())),
        serde_json::Value::String(s) => Value::String(StringValue::new(s, true)),
        serde_json::Value::Array(items) => Value::Sequence(items.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => {
            let mut out = Mapping::new();
            for (k, v) in map {
                out.insert(k, json_to_value(v));
            }
            Value::Mapping(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_and_parses_simple_dict() {
        let v = parse(b"// !$*UTF8*$!\n{ a = 1; b = (1, 2, 3); }").unwrap();
        let m = v.as_mapping().unwrap();
        assert_eq!(m.get("a").unwrap().as_str(), Some("1"));
        assert_eq!(m.get("b").unwrap().as_sequence().unwrap().len(), 3);
    }

    #[test]
    fn agrees_with_classic_on_nested_structures() {
        let src = b"{ objects = { ABC123 = { isa = PBXFileReference; path = \"a b.c\"; }; }; }";
        let fast = parse(src).unwrap();
        let classic = crate::ascii::classic::parse(src).unwrap();
        let fm = fast.as_mapping().unwrap().get("objects").unwrap().as_mapping().unwrap();
        let cm = classic.as_mapping().unwrap().get("objects").unwrap().as_mapping().unwrap();
        assert_eq!(
            fm.get("ABC123").unwrap().as_mapping().unwrap().get("path").unwrap().as_str(),
            cm.get("ABC123").unwrap().as_mapping().unwrap().get("path").unwrap().as_str(),
        );
    }

    #[test]
    fn trailing_comma_in_array_is_ok() {
        let v = parse(b"{ a = (1, 2, ); }").unwrap();
        let m = v.as_mapping().unwrap();
        assert_eq!(m.get("a").unwrap().as_sequence().unwrap().len(), 2);
    }

    #[test]
    fn missing_comma_between_array_elements_is_rejected() {
        let err = parse(b"{ a = (1 2 3); }").unwrap_err();
        assert!(matches!(err, ParseErrorKind::ParseSyntax { .. }));
    }
}
