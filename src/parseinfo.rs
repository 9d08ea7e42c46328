//! Parse diagnostics: what format was detected, and (on failure) a
//! human-readable description of what went wrong.

use crate::error::ParseErrorKind;
use crate::format::Format;
use std::io::{self, Write};

/// Carried alongside the `Option<Value>` returned by [`crate::api::parse`].
#[derive(Debug, Clone)]
pub struct ParseInfo {
    pub detected_format: Format,
    pub error: Option<ParseErrorKind>,
}

impl ParseInfo {
    pub fn ok(detected_format: Format) -> Self {
        Self { detected_format, error: None }
    }

    pub fn failed(detected_format: Format, error: ParseErrorKind) -> Self {
        Self { detected_format, error: Some(error) }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Writes a human-readable diagnostic block describing the result of a
/// parse: on success, a one-line confirmation; on failure, the file
/// name (if any), the detected format, and the full error including
/// its line/column/snippet/caret.
pub fn report_parse_status(
    tree_is_some: bool,
    info: &ParseInfo,
    filename: Option<&str>,
    sink: &mut dyn Write,
) -> io::Result<()> {
    let name = filename.unwrap_or("<input>");
    match &info.error {
        None => {
            writeln!(sink, "{}: parsed OK as {:?}", name, info.detected_format)?;
            let _ = tree_is_some;
        }
        Some(err) => {
            writeln!(sink, "{}: failed to parse as {:?}", name, info.detected_format)?;
            writeln!(sink, "{}", err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;

    #[test]
    fn report_ok() {
        let info = ParseInfo::ok(Format::Xcode);
        let mut buf = Vec::new();
        report_parse_status(true, &info, Some("project.pbxproj"), &mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.contains("parsed OK"));
    }

    #[test]
    fn report_failure_includes_location() {
        let loc = Location { line: 3, column: 5, snippet: "  bad = ;".into(), caret_offset: 5 };
        let info = ParseInfo::failed(
            Format::Xcode,
            ParseErrorKind::MissingTerminator { message: "expected value before ';'".into(), location: loc },
        );
        let mut buf = Vec::new();
        report_parse_status(false, &info, None, &mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.contains("line 3, column 5"));
        assert!(s.contains("<input>"));
    }
}
