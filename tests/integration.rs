//! End-to-end coverage over a whole `project.pbxproj`-shaped fixture:
//! both ASCII parsers, round-tripping through unparse, and the format
//! front-ends, plus a CLI smoke test through the built binary.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use pretty_assertions::assert_eq;
use xcodeprojer::ascii::{classic, fast};
use xcodeprojer::value::{Mapping, Value};
use xcodeprojer::{json, xml, Format};

fn fixture_bytes() -> Vec<u8> {
    fs::read(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mini.pbxproj")).unwrap()
}

/// Strips `was_quoted` (an advisory-only field the unparser never
/// consults) so re-parsed trees compare equal to their source
/// regardless of which quoting form either side happened to pick.
fn normalize(v: &Value) -> Value {
    match v {
        Value::String(s) => Value::string(s.text.clone()),
        Value::Data(b) => Value::Data(b.clone()),
        Value::Sequence(items) => Value::Sequence(items.iter().map(normalize).collect()),
        Value::Mapping(m) => {
            let mut out = Mapping::new();
            for (k, val) in m {
                out.insert(k.clone(), normalize(val));
            }
            Value::Mapping(out)
        }
    }
}

fn object(objects: &Mapping, gid: &str) -> &Mapping {
    objects.get(gid).and_then(Value::as_mapping).unwrap_or_else(|| panic!("missing object {}", gid))
}

#[test]
fn classic_parser_reads_every_section() {
    let tree = classic::parse(&fixture_bytes()).expect("fixture parses");
    let root = tree.as_mapping().unwrap();
    assert_eq!(root.get("archiveVersion").and_then(Value::as_str), Some("1"));
    assert_eq!(root.get("rootObject").and_then(Value::as_str), Some("1111111111111111111133AA"));

    let objects = root.get("objects").and_then(Value::as_mapping).unwrap();
    assert_eq!(objects.len(), 15);

    let native_target = object(objects, "1111111111111111111122AA");
    assert_eq!(native_target.get("isa").and_then(Value::as_str), Some("PBXNativeTarget"));
    assert_eq!(native_target.get("name").and_then(Value::as_str), Some("MiniProject"));

    let project = object(objects, "1111111111111111111133AA");
    let attrs = project.get("attributes").and_then(Value::as_mapping).unwrap();
    assert_eq!(attrs.get("ORGANIZATIONNAME").and_then(Value::as_str), Some("Example Org"));
}

#[test]
fn classic_and_fast_parsers_agree() {
    let bytes = fixture_bytes();
    let classic_tree = classic::parse(&bytes).expect("classic parses");
    let fast_tree = fast::parse(&bytes).expect("fast parses");
    assert_eq!(normalize(&classic_tree), normalize(&fast_tree));
}

#[test]
fn unparse_then_reparse_is_stable() {
    let bytes = fixture_bytes();
    let tree = classic::parse(&bytes).expect("fixture parses");

    let unparsed = xcodeprojer::unparse(&tree, Format::Xcode, "MiniProject").unwrap();
    let reparsed = classic::parse(&unparsed).expect("unparsed output reparses");
    assert_eq!(normalize(&tree), normalize(&reparsed));

    // A second round-trip of the already-canonical text must be a
    // byte-for-byte fixed point.
    let unparsed_again = xcodeprojer::unparse(&reparsed, Format::Xcode, "MiniProject").unwrap();
    assert_eq!(unparsed, unparsed_again);
}

fn canonical_fixture_bytes() -> Vec<u8> {
    fs::read(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mini_canonical.pbxproj")).unwrap()
}

#[test]
fn unparse_reproduces_a_canonical_fixture_byte_for_byte() {
    // `mini_canonical.pbxproj` is already in this crate's canonical
    // layout (unlike `mini.pbxproj`, which is deliberately
    // hand-quoted in a couple of spots to exercise `--lint`
    // rejection), so parsing and re-emitting it must return the
    // exact same bytes — for both the classic and the fast parser.
    let bytes = canonical_fixture_bytes();

    let classic_tree = classic::parse(&bytes).expect("fixture parses via classic");
    let classic_unparsed = xcodeprojer::unparse(&classic_tree, Format::Xcode, "MiniProject").unwrap();
    assert_eq!(String::from_utf8(classic_unparsed).unwrap(), String::from_utf8(bytes.clone()).unwrap());

    let fast_tree = fast::parse(&bytes).expect("fixture parses via fast");
    let fast_unparsed = xcodeprojer::unparse(&fast_tree, Format::Xcode, "MiniProject").unwrap();
    assert_eq!(String::from_utf8(fast_unparsed).unwrap(), String::from_utf8(bytes).unwrap());
}

#[test]
fn unparse_of_the_hand_written_fixture_matches_the_canonical_fixture() {
    // Same object graph as `mini.pbxproj`, differing only in a couple
    // of superfluous quotes around values that don't need them —
    // canonicalizing either one must converge on the same bytes.
    let tree = classic::parse(&fixture_bytes()).expect("fixture parses");
    let unparsed = xcodeprojer::unparse(&tree, Format::Xcode, "MiniProject").unwrap();
    assert_eq!(String::from_utf8(unparsed).unwrap(), String::from_utf8(canonical_fixture_bytes()).unwrap());
}

#[test]
fn unparse_groups_objects_into_isa_sections_with_synthesized_comments() {
    let bytes = fixture_bytes();
    let tree = classic::parse(&bytes).expect("fixture parses");
    let text = String::from_utf8(xcodeprojer::unparse(&tree, Format::Xcode, "MiniProject").unwrap()).unwrap();

    assert!(text.starts_with("// !$*UTF8*$!\n"));
    assert!(text.contains("/* Begin PBXBuildFile section */"));
    assert!(text.contains("/* Begin PBXNativeTarget section */"));
    assert!(text.contains("/* Begin XCConfigurationList section */"));

    // PBXBuildFile comment combines the referenced file's name with its phase.
    assert!(text.contains("main.swift in Sources"));
    // XCConfigurationList comments are derived from their owning target/project.
    assert!(text.contains("Build configuration list for PBXNativeTarget \"MiniProject\""));
    assert!(text.contains("Build configuration list for PBXProject \"MiniProject\""));
    // The PBXProject object itself always gets the constant Xcode literal,
    // not the project name passed to unparse.
    assert!(text.contains("1111111111111111111133AA /* Project object */"));
}

#[test]
fn xml_round_trip_preserves_the_tree() {
    let bytes = fixture_bytes();
    let tree = classic::parse(&bytes).expect("fixture parses");
    let xml_bytes = xcodeprojer::unparse(&tree, Format::Xml, "MiniProject").unwrap();
    let reparsed = xml::parse(&xml_bytes).expect("generated xml parses");
    assert_eq!(normalize(&tree), normalize(&reparsed));
}

#[test]
fn json_round_trip_preserves_the_tree() {
    let bytes = fixture_bytes();
    let tree = classic::parse(&bytes).expect("fixture parses");
    let json_text = json::write(&tree);
    let reparsed = json::parse(json_text.as_bytes()).expect("generated json parses");
    assert_eq!(normalize(&tree), normalize(&reparsed));
}

#[test]
fn gid_split_decodes_every_object_key() {
    let bytes = fixture_bytes();
    let tree = classic::parse(&bytes).expect("fixture parses");
    let objects = tree.as_mapping().unwrap().get("objects").and_then(Value::as_mapping).unwrap();

    let mut decoded: BTreeMap<String, xcodeprojer::gid::GidFields> = BTreeMap::new();
    for gid in objects.keys() {
        decoded.insert(gid.clone(), xcodeprojer::gid::gidfields(gid).unwrap());
    }
    assert_eq!(decoded.len(), 15);
    // user byte is the first two hex chars shared by every gid in this fixture.
    assert!(decoded.values().all(|f| f.user_byte == 0x11));
}

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_xcodeprojer"))
}

#[test]
fn cli_lint_accepts_its_own_canonical_output() {
    let bytes = fixture_bytes();
    let tree = classic::parse(&bytes).expect("fixture parses");
    let canonical = xcodeprojer::unparse(&tree, Format::Xcode, "MiniProject").unwrap();

    let dir = std::env::temp_dir().join(format!("xcodeprojer-lint-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("project.pbxproj");
    fs::write(&path, &canonical).unwrap();

    let output = bin().arg("--lint").arg(&path).output().expect("binary runs");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn cli_lint_rejects_hand_written_fixture_or_reports_parse_failure() {
    // The hand-authored fixture's whitespace does not necessarily match
    // this crate's own canonical layout; --lint must not silently
    // report success in that case.
    let output = bin().arg("--lint").arg(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mini.pbxproj")).output().expect("binary runs");
    assert!(!output.status.success());
}

#[test]
fn cli_convert_to_json_smoke_test() {
    let output = bin()
        .arg("--convert")
        .arg("json")
        .arg(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mini.pbxproj"))
        .output()
        .expect("binary runs");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"rootObject\""));
}

#[test]
fn gidsplit_cli_reports_fields_for_a_known_gid() {
    let output = bin().arg("--gidsplit").arg("1111111111111111111133AA").output().expect("binary runs");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("1111111111111111111133AA"));
}
