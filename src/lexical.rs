//! Character classes and escape handling for the Xcode ASCII plist dialect.

/// Returns true if `c` may appear in an unquoted string token.
///
/// Xcode accepts bare ASCII letters, digits, and a small set of
/// punctuation; anything else (including all non-ASCII bytes) forces
/// the string to be quoted.
pub fn is_unquoted_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.' | '-')
}

/// Returns true if `s` can be written unquoted: non-empty and made
/// entirely of [`is_unquoted_char`] characters.
pub fn is_safe_unquoted(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_unquoted_char)
}

/// Decodes a single backslash escape sequence starting just after the
/// backslash in `rest`. Returns the decoded character(s) and the
/// number of bytes of `rest` consumed (not counting the backslash
/// itself).
///
/// Unrecognized `\X` sequences pass `X` through unchanged, matching
/// Xcode's tolerant behavior.
pub fn decode_escape(rest: &[u8]) -> (String, usize) {
    if rest.is_empty() {
        return (String::new(), 0);
    }
    match rest[0] {
        b'n' => ("\n".into(), 1),
        b'r' => ("\r".into(), 1),
        b't' => ("\t".into(), 1),
        b'a' => ("\u{07}".into(), 1),
        b'b' => ("\u{08}".into(), 1),
        b'v' => ("\u{0B}".into(), 1),
        b'f' => ("\u{0C}".into(), 1),
        b'"' => ("\"".into(), 1),
        b'\\' => ("\\".into(), 1),
        b'U' if rest.len() >= 5 && rest[1..5].iter().all(u8::is_ascii_hexdigit) => {
            let hi = u32::from_str_radix(std::str::from_utf8(&rest[1..5]).unwrap(), 16).unwrap();
            if (0xD800..=0xDBFF).contains(&hi) && rest.len() >= 11 && rest[5] == b'\\' && rest[6] == b'U'
                && rest[7..11].iter().all(u8::is_ascii_hexdigit)
            {
                let lo = u32::from_str_radix(std::str::from_utf8(&rest[7..11]).unwrap(), 16).unwrap();
                if (0xDC00..=0xDFFF).contains(&lo) {
                    let cp = 0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00);
                    if let Some(ch) = char::from_u32(cp) {
                        return (ch.to_string(), 11);
                    }
                }
            }
            match char::from_u32(hi) {
                Some(ch) => (ch.to_string(), 5),
                None => ("\u{FFFD}".into(), 5),
            }
        }
        d if d.is_ascii_digit() && rest.len() >= 3 && rest[1].is_ascii_digit() && rest[2].is_ascii_digit() => {
            let s = std::str::from_utf8(&rest[0..3]).unwrap();
            match u8::from_str_radix(s, 8) {
                Ok(byte) => (char::from(byte).to_string(), 3),
                Err(_) => ((d as char).to_string(), 1),
            }
        }
        other => ((other as char).to_string(), 1),
    }
}

/// Encodes `s` for inclusion inside a double-quoted ASCII plist
/// string: backslash/quote are escaped, control characters use the
/// short mnemonic escapes, and non-ASCII scalars are emitted as
/// `\Uxxxx` (with a surrogate pair for code points beyond the BMP).
pub fn encode_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0B}' => out.push_str("\\v"),
            '\u{0C}' => out.push_str("\\f"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => {
                let cp = c as u32;
                if cp >= 0x10000 {
                    let v = cp - 0x10000;
                    let hi = 0xD800 + (v >> 10);
                    let lo = 0xDC00 + (v & 0x3FF);
                    out.push_str(&format!("\\U{:04x}\\U{:04x}", hi, lo));
                } else {
                    out.push_str(&format!("\\U{:04x}", cp));
                }
            }
        }
    }
    out
}

/// Returns true if `c` may start or continue a line/block comment.
pub fn is_comment_start(bytes: &[u8]) -> Option<CommentKind> {
    if bytes.starts_with(b"//") {
        Some(CommentKind::Line)
    } else if bytes.starts_with(b"/*") {
        Some(CommentKind::Block)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquoted_ascii() {
        assert!(is_safe_unquoted("PBXFileReference"));
        assert!(is_safe_unquoted("foo.bar/baz-quux_1:2"));
        assert!(!is_safe_unquoted(""));
        assert!(!is_safe_unquoted("has space"));
        assert!(!is_safe_unquoted("ünïcode"));
    }

    #[test]
    fn escape_roundtrip_basic() {
        assert_eq!(decode_escape(b"n"), ("\n".to_string(), 1));
        assert_eq!(decode_escape(b"101"), ("A".to_string(), 3));
        assert_eq!(encode_quoted("a\"b\\c\n"), "a\\\"b\\\\c\\n");
    }

    #[test]
    fn unicode_escape_bmp() {
        let (s, n) = decode_escape(b"U00e9");
        assert_eq!(s, "\u{e9}");
        assert_eq!(n, 5);
        assert_eq!(encode_quoted("\u{e9}"), "\\U00e9");
    }

    #[test]
    fn unicode_escape_surrogate_pair() {
        // U+1F600 GRINNING FACE -> surrogate pair D83D DE00
        let encoded = encode_quoted("\u{1F600}");
        assert_eq!(encoded, "\\Ud83d\\Ude00");
        let (s, n) = decode_escape(b"Ud83d\\Ude00");
        assert_eq!(s, "\u{1F600}");
        assert_eq!(n, 11);
    }

    #[test]
    fn unknown_escape_passes_through() {
        assert_eq!(decode_escape(b"q"), ("q".to_string(), 1));
    }
}
