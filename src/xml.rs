//! Hand-rolled reader/writer for Apple's property-list XML dialect
//! (the `<plist>` DTD subset used by Xcode-adjacent tooling).

use crate::error::{Location, ParseErrorKind};
use crate::value::{Mapping, StringValue, Value};

struct XmlReader<'a> {
    src: &'a [u8],
    pos: usize,
}

#[derive(Debug)]
enum Node<'a> {
    Open { name: &'a str, self_closing: bool },
    Close { name: &'a str },
    Text(String),
}

impl<'a> XmlReader<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    fn err(&self, message: impl Into<String>) -> ParseErrorKind {
        ParseErrorKind::XmlSyntax { message: message.into(), location: self.loc(self.pos) }
    }

    fn loc(&self, offset: usize) -> Location {
        crate::ascii::token::location_at(self.src, offset)
    }

    fn skip_misc(&mut self) {
        loop {
            while matches!(self.src.get(self.pos), Some(b) if b.is_ascii_whitespace()) {
                self.pos += 1;
            }
            if self.src[self.pos..].starts_with(b"<?") {
                if let Some(end) = find(&self.src[self.pos..], b"?>") {
                    self.pos += end + 2;
                    continue;
                }
            }
            if self.src[self.pos..].starts_with(b"<!DOCTYPE") {
                if let Some(end) = find(&self.src[self.pos..], b">") {
                    self.pos += end + 1;
                    continue;
                }
            }
            if self.src[self.pos..].starts_with(b"<!--") {
                if let Some(end) = find(&self.src[self.pos..], b"-->") {
                    self.pos += end + 3;
                    continue;
                }
            }
            break;
        }
    }

    fn next_node(&mut self) -> Result<Node<'a>, ParseErrorKind> {
        if self.src[self.pos..].starts_with(b"<!--") {
            let end = find(&self.src[self.pos..], b"-->").ok_or_else(|| self.err("unterminated comment"))?;
            self.pos += end + 3;
            return self.next_node();
        }
        match self.src.get(self.pos) {
            Some(b'<') => {
                let rest = &self.src[self.pos..];
                let close = rest.starts_with(b"</");
                let tag_start = self.pos + if close { 2 } else { 1 };
                let tag_end = self.src[tag_start..]
                    .iter()
                    .position(|&b| b == b'>' || b.is_ascii_whitespace() || b == b'/')
                    .map(|p| tag_start + p)
                    .ok_or_else(|| self.err("unterminated tag"))?;
                let name = std::str::from_utf8(&self.src[tag_start..tag_end]).unwrap_or("");
                let (gt, self_closing) = self.scan_tag_attrs(tag_end)?;
                self.pos = gt + 1;
                if close {
                    Ok(Node::Close { name })
                } else {
                    Ok(Node::Open { name, self_closing })
                }
            }
            Some(_) => {
                let start = self.pos;
                let end = self.src[self.pos..].iter().position(|&b| b == b'<').map(|p| self.pos + p).unwrap_or(self.src.len());
                self.pos = end;
                let raw = std::str::from_utf8(&self.src[start..end]).unwrap_or("");
                Ok(Node::Text(decode_entities(raw)))
            }
            None => Err(self.err("unexpected end of input")),
        }
    }

    /// Scans past the attribute region of a start/end tag starting at
    /// `p` (just after the tag name), validating `name="value"` pairs
    /// rather than blindly hunting for the next `>` byte. Returns the
    /// offset of the closing `>` and whether the tag was self-closing.
    fn scan_tag_attrs(&self, mut p: usize) -> Result<(usize, bool), ParseErrorKind> {
        loop {
            while matches!(self.src.get(p), Some(b) if b.is_ascii_whitespace()) {
                p += 1;
            }
            match self.src.get(p) {
                Some(b'>') => return Ok((p, false)),
                Some(b'/') => {
                    if self.src.get(p + 1) == Some(&b'>') {
                        return Ok((p + 1, true));
                    }
                    return Err(ParseErrorKind::XmlSyntax { message: "stray '/' in tag".into(), location: self.loc(p) });
                }
                Some(&b) if is_attr_name_byte(b) => {
                    while matches!(self.src.get(p), Some(&b) if is_attr_name_byte(b)) {
                        p += 1;
                    }
                    while matches!(self.src.get(p), Some(b) if b.is_ascii_whitespace()) {
                        p += 1;
                    }
                    if self.src.get(p) != Some(&b'=') {
                        return Err(ParseErrorKind::XmlSyntax {
                            message: "expected '=' after attribute name".into(),
                            location: self.loc(p),
                        });
                    }
                    p += 1;
                    while matches!(self.src.get(p), Some(b) if b.is_ascii_whitespace()) {
                        p += 1;
                    }
                    match self.src.get(p) {
                        Some(&q) if q == b'"' || q == b'\'' => {
                            p += 1;
                            while matches!(self.src.get(p), Some(&b) if b != q) {
                                p += 1;
                            }
                            if self.src.get(p) != Some(&q) {
                                return Err(ParseErrorKind::XmlSyntax {
                                    message: "unterminated attribute value".into(),
                                    location: self.loc(p),
                                });
                            }
                            p += 1;
                        }
                        _ => {
                            return Err(ParseErrorKind::XmlSyntax {
                                message: "attribute value must be quoted".into(),
                                location: self.loc(p),
                            });
                        }
                    }
                }
                Some(_) => {
                    return Err(ParseErrorKind::XmlSyntax { message: "malformed tag".into(), location: self.loc(p) });
                }
                None => return Err(ParseErrorKind::XmlSyntax { message: "unterminated tag".into(), location: self.loc(p) }),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseErrorKind> {
        self.skip_misc();
        let node = self.next_node()?;
        match node {
            Node::Open { name: "dict", self_closing: true } => Ok(Value::Mapping(Mapping::new())),
            Node::Open { name: "dict", self_closing: false } => self.parse_dict(),
            Node::Open { name: "array", self_closing: true } => Ok(Value::Sequence(Vec::new())),
            Node::Open { name: "array", self_closing: false } => self.parse_array(),
            Node::Open { name: "string", self_closing: true } => Ok(Value::string("")),
            Node::Open { name: "string", self_closing: false } => {
                let text = self.read_text_until_close("string")?;
                Ok(Value::String(StringValue::unquoted(text)))
            }
            Node::Open { name: "integer", self_closing: false } => {
                let text = self.read_text_until_close("integer")?;
                Ok(Value::string(text))
            }
            Node::Open { name: "real", self_closing: false } => {
                let text = self.read_text_until_close("real")?;
                Ok(Value::string(text))
            }
            Node::Open { name: "true", self_closing } => {
                if !self_closing {
                    self.read_text_until_close("true")?;
                }
                Ok(Value::string("true"))
            }
            Node::Open { name: "false", self_closing } => {
                if !self_closing {
                    self.read_text_until_close("false")?;
                }
                Ok(Value::string("false"))
            }
            Node::Open { name: "data", self_closing: false } => {
                let text = self.read_text_until_close("data")?;
                Ok(Value::Data(decode_base64(&text)))
            }
            Node::Open { name: "data", self_closing: true } => Ok(Value::Data(Vec::new())),
            Node::Open { name, .. } => Err(self.err(format!("unexpected element <{}>", name))),
            other => Err(self.err(format!("expected a value element, found {:?}", other))),
        }
    }

    fn read_text_until_close(&mut self, tag: &str) -> Result<String, ParseErrorKind> {
        let mut text = String::new();
        loop {
            match self.next_node()? {
                Node::Text(t) => text.push_str(&t),
                Node::Close { name } if name == tag => break,
                other => return Err(self.err(format!("expected </{}>, found {:?}", tag, other))),
            }
        }
        Ok(text)
    }

    fn parse_dict(&mut self) -> Result<Value, ParseErrorKind> {
        let mut map = Mapping::new();
        loop {
            self.skip_misc();
            match self.next_node()? {
                Node::Close { name: "dict" } => break,
                Node::Open { name: "key", self_closing: false } => {
                    let key = self.read_text_until_close("key")?;
                    let value = self.parse_value()?;
                    map.insert(key, value);
                }
                Node::Open { name: "key", self_closing: true } => {
                    let value = self.parse_value()?;
                    map.insert(String::new(), value);
                }
                other => return Err(self.err(format!("expected <key> or </dict>, found {:?}", other))),
            }
        }
        Ok(Value::Mapping(map))
    }

    fn parse_array(&mut self) -> Result<Value, ParseErrorKind> {
        let mut items = Vec::new();
        loop {
            self.skip_misc();
            let save = self.pos;
            match self.next_node()? {
                Node::Close { name: "array" } => break,
                _ => {
                    self.pos = save;
                    items.push(self.parse_value()?);
                }
            }
        }
        Ok(Value::Sequence(items))
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn is_attr_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b':' || b == b'.'
}

fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        let mut entity = String::new();
        let mut closed = false;
        for c2 in chars.by_ref() {
            if c2 == ';' {
                closed = true;
                break;
            }
            entity.push(c2);
        }
        if !closed {
            out.push('&');
            out.push_str(&entity);
            continue;
        }
        match entity.as_str() {
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "amp" => out.push('&'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            e if e.starts_with("#x") || e.starts_with("#X") => {
                if let Ok(cp) = u32::from_str_radix(&e[2..], 16) {
                    if let Some(ch) = char::from_u32(cp) {
                        out.push(ch);
                    }
                }
            }
            e if e.starts_with('#') => {
                if let Ok(cp) = e[1..].parse::<u32>() {
                    if let Some(ch) = char::from_u32(cp) {
                        out.push(ch);
                    }
                }
            }
            other => {
                out.push('&');
                out.push_str(other);
                out.push(';');
            }
        }
    }
    out
}

fn encode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

const BASE64_ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_base64(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        let n = ((b0 as u32) << 16) | ((b1 as u32) << 8) | b2 as u32;
        out.push(BASE64_ALPHABET[(n >> 18 & 0x3F) as usize] as char);
        out.push(BASE64_ALPHABET[(n >> 12 & 0x3F) as usize] as char);
        out.push(if chunk.len() > 1 { BASE64_ALPHABET[(n >> 6 & 0x3F) as usize] as char } else { '=' });
        out.push(if chunk.len() > 2 { BASE64_ALPHABET[(n & 0x3F) as usize] as char } else { '=' });
    }
    out
}

fn decode_base64(s: &str) -> Vec<u8> {
    fn val(c: u8) -> Option<u32> {
        BASE64_ALPHABET.iter().position(|&b| b == c).map(|p| p as u32)
    }
    let filtered: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let mut out = Vec::with_capacity(filtered.len() / 4 * 3);
    for chunk in filtered.chunks(4) {
        if chunk.len() < 2 {
            break;
        }
        let c0 = val(chunk[0]).unwrap_or(0);
        let c1 = val(chunk[1]).unwrap_or(0);
        let c2 = chunk.get(2).copied().filter(|&b| b != b'=').and_then(val);
        let c3 = chunk.get(3).copied().filter(|&b| b != b'=').and_then(val);
        let n = (c0 << 18) | (c1 << 12) | (c2.unwrap_or(0) << 6) | c3.unwrap_or(0);
        out.push((n >> 16) as u8);
        if c2.is_some() {
            out.push((n >> 8) as u8);
        }
        if c3.is_some() {
            out.push(n as u8);
        }
    }
    out
}

/// Parses an Apple plist XML document into a `Value` tree.
pub fn parse(src: &[u8]) -> Result<Value, ParseErrorKind> {
    let mut reader = XmlReader::new(src);
    reader.skip_misc();
    match reader.next_node()? {
        Node::Open { name: "plist", self_closing: false } => {
            reader.skip_misc();
            let value = reader.parse_value()?;
            reader.skip_misc();
            match reader.next_node()? {
                Node::Close { name: "plist" } => Ok(value),
                other => Err(reader.err(format!("expected </plist>, found {:?}", other))),
            }
        }
        other => Err(reader.err(format!("expected <plist>, found {:?}", other))),
    }
}

/// Writes `value` as an Apple plist XML document with a two-space
/// indent, matching `plutil`'s conventional output shape closely
/// enough for round-trip use (exact whitespace parity with Xcode's
/// own XML writer is not a goal — only the ASCII dialect is
/// byte-exact, per the crate's scope).
pub fn write(value: &Value) -> Result<String, crate::error::UnparseError> {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n");
    out.push_str("<plist version=\"1.0\">\n");
    write_value(value, 1, &mut out)?;
    out.push('\n');
    out.push_str("</plist>\n");
    Ok(out)
}

fn indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

/// Classifies `s`'s shape so the XML writer can pick the same element
/// name a numeric-valued plist would round-trip through: the ASCII
/// plist dialect stores everything as a string, but a value read back
/// out of `<integer>`/`<real>` XML should be written out the same way,
/// not flattened to `<string>`.
enum NumericShape {
    Integer,
    Real,
    NotNumeric,
}

fn numeric_shape(s: &str) -> NumericShape {
    let body = s.strip_prefix('-').unwrap_or(s);
    if body.is_empty() {
        return NumericShape::NotNumeric;
    }
    if body.bytes().all(|b| b.is_ascii_digit()) {
        return NumericShape::Integer;
    }
    if let Some((int_part, frac_part)) = body.split_once('.') {
        if !int_part.is_empty()
            && !frac_part.is_empty()
            && int_part.bytes().all(|b| b.is_ascii_digit())
            && frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return NumericShape::Real;
        }
    }
    NumericShape::NotNumeric
}

fn write_value(v: &Value, level: usize, out: &mut String) -> Result<(), crate::error::UnparseError> {
    indent(level, out);
    match v {
        Value::String(s) => match numeric_shape(&s.text) {
            NumericShape::Integer => {
                out.push_str("<integer>");
                out.push_str(&s.text);
                out.push_str("</integer>");
            }
            NumericShape::Real => {
                out.push_str("<real>");
                out.push_str(&s.text);
                out.push_str("</real>");
            }
            NumericShape::NotNumeric => {
                out.push_str("<string>");
                out.push_str(&encode_entities(&s.text));
                out.push_str("</string>");
            }
        },
        Value::Data(bytes) => {
            out.push_str("<data>");
            out.push_str(&encode_base64(bytes));
            out.push_str("</data>");
        }
        Value::Sequence(items) => {
            if items.is_empty() {
                out.push_str("<array/>");
            } else {
                out.push_str("<array>\n");
                for item in items {
                    write_value(item, level + 1, out)?;
                    out.push('\n');
                }
                indent(level, out);
                out.push_str("</array>");
            }
        }
        Value::Mapping(m) => {
            if m.is_empty() {
                out.push_str("<dict/>");
            } else {
                out.push_str("<dict>\n");
                for (k, v) in m {
                    indent(level + 1, out);
                    out.push_str("<key>");
                    out.push_str(&encode_entities(k));
                    out.push_str("</key>\n");
                    write_value(v, level + 1, out)?;
                    out.push('\n');
                }
                indent(level, out);
                out.push_str("</dict>");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_simple_dict() {
        let xml = b"<?xml version=\"1.0\"?>\n<plist version=\"1.0\"><dict><key>a</key><string>hi</string></dict></plist>";
        let v = parse(xml).unwrap();
        let m = v.as_mapping().unwrap();
        assert_eq!(m.get("a").unwrap().as_str(), Some("hi"));
    }

    #[test]
    fn writer_produces_parseable_xml() {
        let mut m = Mapping::new();
        m.insert("name".into(), Value::string("Demo & Friends"));
        m.insert("list".into(), Value::Sequence(vec![Value::string("a"), Value::string("b")]));
        let written = write(&Value::Mapping(m)).unwrap();
        let reparsed = parse(written.as_bytes()).unwrap();
        let rm = reparsed.as_mapping().unwrap();
        assert_eq!(rm.get("name").unwrap().as_str(), Some("Demo & Friends"));
        assert_eq!(rm.get("list").unwrap().as_sequence().unwrap().len(), 2);
    }

    #[test]
    fn numeric_shaped_strings_write_as_integer_or_real() {
        let mut m = Mapping::new();
        m.insert("count".into(), Value::string("2147483647"));
        m.insert("ratio".into(), Value::string("1.5"));
        m.insert("version".into(), Value::string("not-a-number.path"));
        let written = write(&Value::Mapping(m)).unwrap();
        assert!(written.contains("<integer>2147483647</integer>"));
        assert!(written.contains("<real>1.5</real>"));
        assert!(written.contains("<string>not-a-number.path</string>"));

        let reparsed = parse(written.as_bytes()).unwrap();
        let rm = reparsed.as_mapping().unwrap();
        assert_eq!(rm.get("count").unwrap().as_str(), Some("2147483647"));
        assert_eq!(rm.get("ratio").unwrap().as_str(), Some("1.5"));
    }

    #[test]
    fn unquoted_attribute_value_is_rejected_with_a_location() {
        let xml = b"<?xml version=\"1.0\"?>\n<!DOCTYPE plist>\n<plist version=1.0\">\n</plist>";
        let err = parse(xml).unwrap_err();
        match err {
            ParseErrorKind::XmlSyntax { message, location } => {
                assert!(message.contains("quoted"), "unexpected message: {}", message);
                assert_eq!(location.line, 3);
                let caret_byte = location.snippet.as_bytes()[location.caret_offset];
                assert_eq!(caret_byte, b'1');
            }
            other => panic!("expected XmlSyntax, got {:?}", other),
        }
    }

    #[test]
    fn entity_and_numeric_refs_decode() {
        let xml = b"<plist><string>a &lt;b&gt; &#65; &#x42;</string></plist>";
        let v = parse(xml).unwrap();
        assert_eq!(v.as_str(), Some("a <b> A B"));
    }

    #[test]
    fn data_roundtrips() {
        let mut m = Mapping::new();
        m.insert("blob".into(), Value::Data(b"hello world".to_vec()));
        let written = write(&Value::Mapping(m)).unwrap();
        let reparsed = parse(written.as_bytes()).unwrap();
        let rm = reparsed.as_mapping().unwrap();
        match rm.get("blob").unwrap() {
            Value::Data(bytes) => assert_eq!(bytes, b"hello world"),
            _ => panic!("expected data"),
        }
    }
}
