//! Structured error types for every fallible surface in the crate.

use std::fmt;

/// A location in a source buffer, used by every error kind that can
/// point at an offending byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub snippet: String,
    pub caret_offset: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "line {}, column {}:", self.line, self.column)?;
        writeln!(f, "{}", self.snippet)?;
        write!(f, "{}^", " ".repeat(self.caret_offset))
    }
}

/// Errors produced while parsing any of the supported input formats.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("syntax error: {message}\n{location}")]
    ParseSyntax { message: String, location: Location },

    #[error("recursion limit ({limit}) exceeded\n{location}")]
    RecursionLimit { limit: usize, location: Location },

    #[error("missing terminator: {message}\n{location}")]
    MissingTerminator { message: String, location: Location },

    #[error("invalid escape sequence: {message}\n{location}")]
    InvalidEscape { message: String, location: Location },

    #[error("could not determine input format")]
    UnknownFormat,

    #[error("XML syntax error: {message}\n{location}")]
    XmlSyntax { message: String, location: Location },

    #[error("JSON syntax error: {message}")]
    JsonSyntax { message: String },
}

/// Errors produced while unparsing a tree back to bytes. Unlike
/// [`ParseErrorKind`], these indicate the caller handed the unparser a
/// malformed tree (not something recoverable by re-parsing), so they
/// are treated as programming errors and propagated with `?` rather
/// than collected into a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnparseError {
    #[error("document root must be a mapping")]
    RootNotMapping,

    #[error("object {gid} has a non-string or missing `isa`")]
    MissingIsa { gid: String },

    #[error("value at {path} is not valid for this format: {message}")]
    InvalidValue { path: String, message: String },
}

/// Errors produced while decoding or generating a gid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GidError {
    #[error("gid must be exactly 24 hex characters, got {len} in {gid:?}")]
    BadLength { gid: String, len: usize },

    #[error("gid contains non-hex characters: {gid:?}")]
    NotHex { gid: String },
}

/// Top-level error type for the CLI binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Gid(#[from] GidError),

    #[error(transparent)]
    Unparse(#[from] UnparseError),

    #[error("parsing failed:\n{0}")]
    ParseFailed(String),

    #[error("lint failed: {0}")]
    LintFailed(String),
}
