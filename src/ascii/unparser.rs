//! Canonical ASCII plist writer: reproduces Xcode's own formatting
//! byte-for-byte for an unmodified, canonically-ordered tree.

use crate::comments::{is_no_comment_zone_key, synthesize_comments};
use crate::error::UnparseError;
use crate::lexical::{encode_quoted, is_safe_unquoted};
use crate::value::{Mapping, Value};
use std::collections::HashMap;

/// The isa order Xcode groups `objects` sections in. Any isa not
/// listed here is appended afterward in ascending lexicographic order,
/// so unrecognized object types still round-trip deterministically.
pub const ISA_ORDER: &[&str] = &[
    "PBXBuildFile",
    "PBXAppleScriptBuildPhase",
    "PBXContainerItemProxy",
    "PBXCopyFilesBuildPhase",
    "PBXFileReference",
    "PBXFrameworksBuildPhase",
    "PBXGroup",
    "PBXHeadersBuildPhase",
    "PBXLegacyTarget",
    "PBXNativeTarget",
    "PBXAggregateTarget",
    "PBXProject",
    "PBXReferenceProxy",
    "PBXResourcesBuildPhase",
    "PBXRezBuildPhase",
    "PBXShellScriptBuildPhase",
    "PBXSourcesBuildPhase",
    "PBXTargetDependency",
    "PBXVariantGroup",
    "XCBuildConfiguration",
    "XCConfigurationList",
    "XCVersionGroup",
    "XCLocalSwiftPackageReference",
    "XCRemoteSwiftPackageReference",
    "XCSwiftPackageProductDependency",
];

/// Object classes Xcode always writes on a single line, regardless of
/// how many keys they carry.
const INLINE_ISA: &[&str] = &["PBXBuildFile", "PBXFileReference"];

pub struct Unparser<'a> {
    buf: String,
    indents: Vec<String>,
    comments: HashMap<String, String>,
    project_name: &'a str,
}

impl<'a> Unparser<'a> {
    pub fn new(project_name: &'a str) -> Self {
        Self { buf: String::new(), indents: vec![String::new()], comments: HashMap::new(), project_name }
    }

    fn indent(&mut self, level: usize) -> &str {
        while self.indents.len() <= level {
            let prev = self.indents.last().unwrap().clone();
            self.indents.push(format!("{}\t", prev));
        }
        &self.indents[level]
    }

    /// Unparses `root` (must be a `Mapping`) into the canonical ASCII
    /// plist text, including the `// !$*UTF8*$!` header.
    pub fn unparse(mut self, root: &Value) -> Result<String, UnparseError> {
        let top = root.as_mapping().ok_or(UnparseError::RootNotMapping)?;

        if let Some(Value::Mapping(objects)) = top.get("objects") {
            self.comments = synthesize_comments(objects, self.project_name);
        }

        self.buf.push_str("// !$*UTF8*$!\n{\n");
        self.write_object_fields(top, 1)?;
        self.buf.push_str("}\n");
        Ok(self.buf)
    }

    fn write_value(&mut self, v: &Value, level: usize) -> Result<(), UnparseError> {
        match v {
            Value::String(s) => self.write_string(&s.text),
            Value::Data(bytes) => self.write_data(bytes),
            Value::Sequence(items) => self.write_sequence(items, level),
            Value::Mapping(m) => self.write_mapping(m, level),
        }
    }

    fn write_string(&mut self, s: &str) {
        if is_safe_unquoted(s) {
            self.buf.push_str(s);
        } else {
            self.buf.push('"');
            self.buf.push_str(&encode_quoted(s));
            self.buf.push('"');
        }
        if let Some(comment) = self.comments.get(s) {
            self.buf.push_str(" /* ");
            self.buf.push_str(comment);
            self.buf.push_str(" */");
        }
    }

    fn write_data(&mut self, bytes: &[u8]) {
        self.buf.push('<');
        for (i, chunk) in bytes.chunks(4).enumerate() {
            if i > 0 {
                self.buf.push(' ');
            }
            for b in chunk {
                self.buf.push_str(&format!("{:02X}", b));
            }
        }
        self.buf.push('>');
    }

    /// Sequences are always written multi-line, one element per line,
    /// even when empty — Xcode never collapses a top-level `( )` to a
    /// single line outside of an inline (`PBXBuildFile`/
    /// `PBXFileReference`) object; see `write_value_inline` for that case.
    fn write_sequence(&mut self, items: &[Value], level: usize) -> Result<(), UnparseError> {
        self.buf.push_str("(\n");
        let child_indent = self.indent(level + 1).to_string();
        for item in items {
            self.buf.push_str(&child_indent);
            self.write_value(item, level + 1)?;
            self.buf.push_str(",\n");
        }
        self.buf.push_str(&self.indent(level).to_string());
        self.buf.push(')');
        Ok(())
    }

    fn write_mapping(&mut self, m: &Mapping, level: usize) -> Result<(), UnparseError> {
        let isa = m.get("isa").and_then(Value::as_str);
        if let Some(isa) = isa {
            if INLINE_ISA.contains(&isa) {
                return self.write_mapping_inline(m);
            }
        }
        if m.is_empty() {
            self.buf.push_str("{\n");
            self.buf.push_str(&self.indent(level).to_string());
            self.buf.push('}');
            return Ok(());
        }
        self.buf.push_str("{\n");
        self.write_object_fields(m, level + 1)?;
        self.buf.push_str(&self.indent(level).to_string());
        self.buf.push('}');
        Ok(())
    }

    fn write_mapping_inline(&mut self, m: &Mapping) -> Result<(), UnparseError> {
        self.buf.push_str("{");
        let mut keys: Vec<&String> = m.keys().collect();
        keys.sort_by(|a, b| key_order(a.as_str()).cmp(&key_order(b.as_str())));
        for k in keys {
            let v = &m[k];
            self.write_string(k);
            self.buf.push_str(" = ");
            self.write_value_inline(v)?;
            self.buf.push_str("; ");
        }
        self.buf.push('}');
        Ok(())
    }

    fn write_value_inline(&mut self, v: &Value) -> Result<(), UnparseError> {
        match v {
            Value::String(s) => {
                self.write_string(&s.text);
                Ok(())
            }
            Value::Data(bytes) => {
                self.write_data(bytes);
                Ok(())
            }
            Value::Sequence(items) => {
                self.buf.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.buf.push_str(", ");
                    }
                    self.write_value_inline(item)?;
                }
                self.buf.push(')');
                Ok(())
            }
            Value::Mapping(m) => self.write_mapping_inline(m),
        }
    }

    /// Writes `isa` first, then the remaining keys in ASCII
    /// lexicographic order, one `key = value;` per line at `level`.
    /// Special-cases the top-level `objects` mapping to emit
    /// isa-grouped section banners instead of plain key ordering.
    fn write_object_fields(&mut self, m: &Mapping, level: usize) -> Result<(), UnparseError> {
        let indent = self.indent(level).to_string();
        let mut keys: Vec<&String> = m.keys().collect();
        keys.sort_by(|a, b| key_order(a.as_str()).cmp(&key_order(b.as_str())));

        for k in keys {
            let v = &m[k];
            if k == "objects" {
                if let Value::Mapping(objects) = v {
                    self.buf.push_str(&indent);
                    self.buf.push_str("objects = {\n");
                    self.write_objects_sections(objects, level + 1)?;
                    self.buf.push_str(&indent);
                    self.buf.push_str("};\n");
                    continue;
                }
            }
            self.buf.push_str(&indent);
            self.write_string(k);
            self.buf.push_str(" = ");
            if is_no_comment_zone_key(k) {
                let saved = std::mem::take(&mut self.comments);
                self.write_value(v, level)?;
                self.comments = saved;
            } else {
                self.write_value(v, level)?;
            }
            self.buf.push_str(";\n");
        }
        Ok(())
    }

    fn write_objects_sections(&mut self, objects: &Mapping, level: usize) -> Result<(), UnparseError> {
        let mut by_isa: std::collections::BTreeMap<&str, Vec<&String>> = std::collections::BTreeMap::new();
        for (gid, obj) in objects {
            let map = obj.as_mapping().ok_or_else(|| UnparseError::MissingIsa { gid: gid.clone() })?;
            let isa = map.get("isa").and_then(Value::as_str).ok_or_else(|| UnparseError::MissingIsa { gid: gid.clone() })?;
            by_isa.entry(isa).or_default().push(gid);
        }
        for gids in by_isa.values_mut() {
            gids.sort();
        }

        let indent = self.indent(level).to_string();
        let mut ordered_isas: Vec<&str> = Vec::new();
        for known in ISA_ORDER {
            if by_isa.contains_key(known) {
                ordered_isas.push(known);
            }
        }
        for isa in by_isa.keys() {
            if !ISA_ORDER.contains(isa) {
                ordered_isas.push(isa);
            }
        }

        for isa in ordered_isas.iter() {
            self.buf.push('\n');
            self.buf.push_str("/* Begin ");
            self.buf.push_str(isa);
            self.buf.push_str(" section */\n");
            for gid in &by_isa[isa] {
                let obj = objects.get(*gid).unwrap();
                let map = obj.as_mapping().unwrap();
                self.buf.push_str(&indent);
                self.write_string(gid);
                self.buf.push_str(" = ");
                self.write_mapping(map, level)?;
                self.buf.push_str(";\n");
            }
            self.buf.push_str("/* End ");
            self.buf.push_str(isa);
            self.buf.push_str(" section */\n");
        }
        Ok(())
    }
}

/// `isa` always sorts first; everything else is ASCII-lexicographic.
fn key_order(k: &str) -> (u8, &str) {
    if k == "isa" {
        (0, k)
    } else {
        (1, k)
    }
}

/// Unparses `root` into the canonical ASCII plist byte form.
pub fn unparse(root: &Value, project_name: &str) -> Result<String, UnparseError> {
    Unparser::new(project_name).unparse(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::classic;

    #[test]
    fn roundtrip_minimal_project() {
        let src = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	objects = {

/* Begin PBXFileReference section */
		AAAAAAAAAAAAAAAAAAAAAAAA /* main.swift */ = {isa = PBXFileReference; path = "main.swift"; sourceTree = "<group>"; };
/* End PBXFileReference section */
	};
	rootObject = AAAAAAAAAAAAAAAAAAAAAAAA;
}
"#;
        let tree = classic::parse(src.as_bytes()).unwrap();
        let out = unparse(&tree, "Demo").unwrap();
        assert!(out.contains("/* Begin PBXFileReference section */"));
        assert!(out.contains("main.swift"));
    }

    #[test]
    fn buildfile_and_fileref_are_inline() {
        let mut objects = Mapping::new();
        let mut fr = Mapping::new();
        fr.insert("isa".into(), Value::string("PBXFileReference"));
        fr.insert("path".into(), Value::string("a.swift"));
        fr.insert("sourceTree".into(), Value::string("<group>"));
        objects.insert("AAAAAAAAAAAAAAAAAAAAAAAA".into(), Value::Mapping(fr));
        let mut root = Mapping::new();
        root.insert("objects".into(), Value::Mapping(objects));
        let out = unparse(&Value::Mapping(root), "Demo").unwrap();
        assert!(out.contains("{isa = PBXFileReference; path = \"a.swift\"; sourceTree = \"<group>\"; }"));
    }

    #[test]
    fn isa_sorts_first_among_keys() {
        let mut objects = Mapping::new();
        let mut grp = Mapping::new();
        grp.insert("sourceTree".into(), Value::string("<group>"));
        grp.insert("isa".into(), Value::string("PBXGroup"));
        grp.insert("children".into(), Value::Sequence(vec![]));
        objects.insert("GID1".into(), Value::Mapping(grp));
        let mut root = Mapping::new();
        root.insert("objects".into(), Value::Mapping(objects));
        let out = unparse(&Value::Mapping(root), "Demo").unwrap();
        let isa_pos = out.find("isa = PBXGroup").unwrap();
        let children_pos = out.find("children").unwrap();
        assert!(isa_pos < children_pos);
    }
}
