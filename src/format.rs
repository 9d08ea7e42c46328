//! Format autodetection for the three supported serializations.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Auto,
    Xcode,
    Xml,
    Json,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Auto => "auto",
            Format::Xcode => "xcode",
            Format::Xml => "xml",
            Format::Json => "json",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Format::Auto),
            "xcode" => Ok(Format::Xcode),
            "xml" => Ok(Format::Xml),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown format {:?} (expected xcode, xml, or json)", other)),
        }
    }
}

const UTF8_HEADER: &str = "// !$*UTF8*$!";

/// Sniffs `bytes` to decide which parser to invoke. The UTF-8 header
/// comment, if present anywhere near the start, is checked first since
/// it is an unambiguous Xcode signature; otherwise the first
/// non-whitespace byte decides between XML (`<`), JSON (a `{` whose
/// first key is immediately quoted), and the ASCII plist dialect.
pub fn detect_format(bytes: &[u8]) -> Format {
    let text_start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(0);
    let rest = &bytes[text_start..];

    if rest.starts_with(UTF8_HEADER.as_bytes()) {
        return Format::Xcode;
    }

    match rest.first() {
        Some(b'<') => Format::Xml,
        Some(b'{') => {
            if looks_like_json(rest) {
                Format::Json
            } else {
                Format::Xcode
            }
        }
        Some(_) => Format::Xcode,
        None => Format::Auto,
    }
}

/// Heuristic: valid JSON object keys are always double-quoted
/// immediately after `{` (ignoring whitespace/comments), whereas the
/// ASCII plist dialect permits unquoted identifier keys. Look at the
/// first non-whitespace, non-comment byte after the opening brace.
fn looks_like_json(rest: &[u8]) -> bool {
    let mut i = 1; // skip the leading '{'
    loop {
        while i < rest.len() && rest[i].is_ascii_whitespace() {
            i += 1;
        }
        if rest[i..].starts_with(b"//") {
            if let Some(nl) = rest[i..].iter().position(|&b| b == b'\n') {
                i += nl + 1;
                continue;
            }
            return true; // comment runs to EOF; ambiguous, default to JSON attempt
        }
        if rest[i..].starts_with(b"/*") {
            if let Some(end) = find_subslice(&rest[i..], b"*/") {
                i += end + 2;
                continue;
            }
            return true;
        }
        break;
    }
    matches!(rest.get(i), Some(b'"') | Some(b'}'))
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_xcode_header() {
        assert_eq!(detect_format(b"// !$*UTF8*$!\n{ a = 1; }"), Format::Xcode);
    }

    #[test]
    fn detects_xml() {
        assert_eq!(detect_format(b"  <?xml version=\"1.0\"?>"), Format::Xml);
    }

    #[test]
    fn detects_json() {
        assert_eq!(detect_format(br#"{"a": "1"}"#), Format::Json);
    }

    #[test]
    fn detects_xcode_unquoted_keys() {
        assert_eq!(detect_format(b"{ a = 1; }"), Format::Xcode);
    }
}
