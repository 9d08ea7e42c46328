//! Parses, manipulates, and re-serializes Xcode `project.pbxproj`
//! files.
//!
//! The core is a parser/unparser pair for Xcode's legacy ASCII
//! ("old-style") property list dialect (see [`ascii`]), with sibling
//! front-ends for the XML plist ([`xml`]) and JSON ([`json`])
//! representations. [`comments`] rebuilds the human-readable
//! `/* ... */` annotations Xcode attaches to every object reference,
//! and [`gid`] generates and decodes Xcode-compatible object
//! identifiers.
//!
//! [`api::parse`] and [`api::unparse`] are the format-agnostic entry
//! points most callers want; the format-specific modules are public
//! for callers who already know which dialect they're handling.

pub mod api;
pub mod ascii;
pub mod comments;
pub mod error;
pub mod format;
pub mod gid;
pub mod json;
pub mod lexical;
pub mod parseinfo;
pub mod value;
pub mod xml;

pub use api::{find_projectfiles, parse, projectname_for_path, unparse};
pub use ascii::ParserKind;
pub use format::Format;
pub use value::{Mapping, Value};
