//! The Xcode ASCII plist dialect: tokenizer, two parsers sharing one
//! tree model, and the canonical unparser.

pub mod classic;
pub mod fast;
pub mod token;
pub mod unparser;

/// Selects which parser implementation handles ASCII plist input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// Recursive descent with precise line/column error reporting.
    Classic,
    /// Rewrite-to-JSON delegate; faster, coarser error locations.
    Fast,
}
