//! Top-level, format-agnostic parse/unparse entry points and small
//! filesystem helpers used by the CLI.

use crate::ascii::{self, ParserKind};
use crate::error::{ParseErrorKind, UnparseError};
use crate::format::{detect_format, Format};
use crate::parseinfo::ParseInfo;
use crate::value::Value;
use crate::{json, xml};
use std::path::{Path, PathBuf};

/// Parses `bytes`, autodetecting the format unless `format` pins one.
/// `parser` selects the ASCII plist implementation when the resolved
/// format is [`Format::Xcode`]; it is ignored otherwise.
///
/// Returns `(None, info)` on failure, with `info.error` set; the tree
/// is never partially populated.
pub fn parse(bytes: &[u8], format: Format, parser: ParserKind) -> (Option<Value>, ParseInfo) {
    let resolved = match format {
        Format::Auto => detect_format(bytes),
        other => other,
    };

    let result = match resolved {
        Format::Xcode => match parser {
            ParserKind::Classic => ascii::classic::parse(bytes),
            ParserKind::Fast => ascii::fast::parse(bytes),
        },
        Format::Xml => xml::parse(bytes),
        Format::Json => json::parse(bytes),
        Format::Auto => Err(ParseErrorKind::UnknownFormat),
    };

    match result {
        Ok(tree) => (Some(tree), ParseInfo::ok(resolved)),
        Err(err) => (None, ParseInfo::failed(resolved, err)),
    }
}

/// Unparses `tree` into `format`'s textual representation.
/// `projectname` is used by the ASCII unparser's comment synthesizer
/// for the `PBXProject` object's comment.
pub fn unparse(tree: &Value, format: Format, projectname: &str) -> Result<Vec<u8>, UnparseError> {
    match format {
        Format::Xml => xml::write(tree).map(String::into_bytes),
        Format::Json => Ok(json::write(tree).into_bytes()),
        Format::Xcode | Format::Auto => ascii::unparser::unparse(tree, projectname).map(String::into_bytes),
    }
}

/// Derives a project's display name from a path ending in
/// `Name.xcodeproj/project.pbxproj` (or `Name.xcodeproj` directly).
pub fn projectname_for_path(path: &Path) -> Option<String> {
    let mut components: Vec<_> = path.components().collect();
    while let Some(c) = components.pop() {
        let s = c.as_os_str().to_str()?;
        if let Some(stripped) = s.strip_suffix(".xcodeproj") {
            return Some(stripped.to_string());
        }
    }
    None
}

/// Walks `root_path` recursively and returns every `project.pbxproj`
/// found beneath it, in directory-walk order.
pub fn find_projectfiles(root_path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(root_path).into_iter() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && entry.file_name() == "project.pbxproj" {
            out.push(entry.path().to_path_buf());
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projectname_for_path_strips_suffix() {
        let p = Path::new("/tmp/MyApp.xcodeproj/project.pbxproj");
        assert_eq!(projectname_for_path(p), Some("MyApp".to_string()));
    }

    #[test]
    fn parse_autodetects_and_unparse_roundtrips_json() {
        let (tree, info) = parse(br#"{"a": "1"}"#, Format::Auto, ParserKind::Classic);
        assert!(info.is_ok());
        let tree = tree.unwrap();
        let bytes = unparse(&tree, Format::Json, "Demo").unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("\"a\""));
    }

    #[test]
    fn parse_reports_failure_without_panicking() {
        let (tree, info) = parse(b"{ a = ", Format::Xcode, ParserKind::Classic);
        assert!(tree.is_none());
        assert!(!info.is_ok());
    }
}
