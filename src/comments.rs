//! Synthesizes the human-readable `/* ... */` comments Xcode attaches
//! to every gid reference, by walking the object graph once and
//! applying a per-`isa` naming rule.

use crate::value::{Mapping, Value};
use std::collections::HashMap;

/// Known Xcode object classes, with the predicates and default labels
/// the comment synthesizer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Isa {
    PBXBuildFile,
    PBXFileReference,
    PBXGroup,
    PBXVariantGroup,
    XCVersionGroup,
    PBXNativeTarget,
    PBXAggregateTarget,
    PBXLegacyTarget,
    PBXProject,
    PBXContainerItemProxy,
    PBXTargetDependency,
    PBXReferenceProxy,
    XCBuildConfiguration,
    XCConfigurationList,
    PBXSourcesBuildPhase,
    PBXResourcesBuildPhase,
    PBXFrameworksBuildPhase,
    PBXHeadersBuildPhase,
    PBXCopyFilesBuildPhase,
    PBXShellScriptBuildPhase,
    PBXAppleScriptBuildPhase,
    PBXRezBuildPhase,
    XCSwiftPackageProductDependency,
    XCRemoteSwiftPackageReference,
    XCLocalSwiftPackageReference,
    Other,
}

impl Isa {
    pub fn parse(s: &str) -> Isa {
        match s {
            "PBXBuildFile" => Isa::PBXBuildFile,
            "PBXFileReference" => Isa::PBXFileReference,
            "PBXGroup" => Isa::PBXGroup,
            "PBXVariantGroup" => Isa::PBXVariantGroup,
            "XCVersionGroup" => Isa::XCVersionGroup,
            "PBXNativeTarget" => Isa::PBXNativeTarget,
            "PBXAggregateTarget" => Isa::PBXAggregateTarget,
            "PBXLegacyTarget" => Isa::PBXLegacyTarget,
            "PBXProject" => Isa::PBXProject,
            "PBXContainerItemProxy" => Isa::PBXContainerItemProxy,
            "PBXTargetDependency" => Isa::PBXTargetDependency,
            "PBXReferenceProxy" => Isa::PBXReferenceProxy,
            "XCBuildConfiguration" => Isa::XCBuildConfiguration,
            "XCConfigurationList" => Isa::XCConfigurationList,
            "PBXSourcesBuildPhase" => Isa::PBXSourcesBuildPhase,
            "PBXResourcesBuildPhase" => Isa::PBXResourcesBuildPhase,
            "PBXFrameworksBuildPhase" => Isa::PBXFrameworksBuildPhase,
            "PBXHeadersBuildPhase" => Isa::PBXHeadersBuildPhase,
            "PBXCopyFilesBuildPhase" => Isa::PBXCopyFilesBuildPhase,
            "PBXShellScriptBuildPhase" => Isa::PBXShellScriptBuildPhase,
            "PBXAppleScriptBuildPhase" => Isa::PBXAppleScriptBuildPhase,
            "PBXRezBuildPhase" => Isa::PBXRezBuildPhase,
            "XCSwiftPackageProductDependency" => Isa::XCSwiftPackageProductDependency,
            "XCRemoteSwiftPackageReference" => Isa::XCRemoteSwiftPackageReference,
            "XCLocalSwiftPackageReference" => Isa::XCLocalSwiftPackageReference,
            _ => Isa::Other,
        }
    }

    pub fn is_build_phase(&self) -> bool {
        matches!(
            self,
            Isa::PBXSourcesBuildPhase
                | Isa::PBXResourcesBuildPhase
                | Isa::PBXFrameworksBuildPhase
                | Isa::PBXHeadersBuildPhase
                | Isa::PBXCopyFilesBuildPhase
                | Isa::PBXShellScriptBuildPhase
                | Isa::PBXAppleScriptBuildPhase
                | Isa::PBXRezBuildPhase
        )
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Isa::PBXNativeTarget | Isa::PBXAggregateTarget | Isa::PBXLegacyTarget)
    }

    pub fn default_build_phase_name(&self) -> Option<&'static str> {
        match self {
            Isa::PBXSourcesBuildPhase => Some("Sources"),
            Isa::PBXFrameworksBuildPhase => Some("Frameworks"),
            Isa::PBXResourcesBuildPhase => Some("Resources"),
            Isa::PBXCopyFilesBuildPhase => Some("CopyFiles"),
            Isa::PBXHeadersBuildPhase => Some("Headers"),
            Isa::PBXShellScriptBuildPhase => Some("ShellScript"),
            Isa::PBXAppleScriptBuildPhase => Some("AppleScript"),
            Isa::PBXRezBuildPhase => Some("Rez"),
            _ => None,
        }
    }
}

fn isa_of(obj: &Mapping) -> Isa {
    obj.get("isa").and_then(Value::as_str).map(Isa::parse).unwrap_or(Isa::Other)
}

fn str_field<'a>(obj: &'a Mapping, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Computes the trailing comment for every gid in `objects`.
///
/// `project_name` is used only for the `XCConfigurationList` owner
/// comment when the owner is the `PBXProject` object itself; the
/// `PBXProject` gid's own comment is always the constant
/// `"Project object"`, matching Xcode.
pub fn synthesize_comments(objects: &Mapping, project_name: &str) -> HashMap<String, String> {
    let mut owner_configlist: HashMap<&str, (&str, &str)> = HashMap::new(); // configlist gid -> (owner isa label, owner name)
    let mut owner_phase: HashMap<&str, &str> = HashMap::new(); // buildfile gid -> phase display
    let mut main_group: Option<&str> = None;

    for (gid, obj) in objects {
        let Some(map) = obj.as_mapping() else { continue };
        let isa = isa_of(map);

        if isa.is_target() || isa == Isa::PBXProject {
            if let Some(cl) = str_field(map, "buildConfigurationList") {
                // Xcode's own comment names the owner by its literal `isa`
                // (e.g. "PBXNativeTarget", "PBXProject"), not a generic label.
                let owner_isa_label = str_field(map, "isa").unwrap_or("PBXProject");
                let owner_name = str_field(map, "name").unwrap_or(project_name);
                owner_configlist.insert(cl, (owner_isa_label, owner_name));
            }
        }

        if isa == Isa::PBXProject {
            main_group = str_field(map, "mainGroup");
        }

        if isa.is_build_phase() {
            if let Some(files) = map.get("files").and_then(Value::as_sequence) {
                for f in files {
                    if let Some(fgid) = f.as_str() {
                        owner_phase.insert(fgid, gid.as_str());
                    }
                }
            }
        }
    }

    // Second pass: owner_phase currently maps buildfile gid -> owning
    // phase's own gid; resolve to a display string now that all
    // objects have been scanned once.
    let mut phase_display_by_gid: HashMap<&str, String> = HashMap::new();
    for (gid, obj) in objects {
        if let Some(map) = obj.as_mapping() {
            let isa = isa_of(map);
            if isa.is_build_phase() {
                phase_display_by_gid.insert(gid.as_str(), display_name(map, isa, objects, false));
            }
        }
    }

    let mut out = HashMap::new();
    for (gid, obj) in objects {
        let Some(map) = obj.as_mapping() else { continue };
        let isa = isa_of(map);
        if isa == Isa::Other {
            continue;
        }
        let name = match isa {
            Isa::PBXBuildFile => {
                let fileref_display = map
                    .get("fileRef")
                    .and_then(Value::as_str)
                    .and_then(|g| objects.get(g))
                    .and_then(Value::as_mapping)
                    .map(|m| display_name(m, isa_of(m), objects, false))
                    .unwrap_or_else(|| {
                        log::warn!("PBXBuildFile {} has an unresolvable fileRef", gid);
                        "(unknown)".to_string()
                    });
                match owner_phase.get(gid.as_str()).and_then(|pg| phase_display_by_gid.get(pg)) {
                    Some(phase) => format!("{} in {}", fileref_display, phase),
                    None => fileref_display,
                }
            }
            Isa::XCConfigurationList => match owner_configlist.get(gid.as_str()) {
                Some((label, name)) => format!("Build configuration list for {} \"{}\"", label, name),
                None => "Build configuration list".to_string(),
            },
            _ => display_name(map, isa, objects, main_group == Some(gid.as_str())),
        };
        if !name.is_empty() {
            out.insert(gid.clone(), name);
        }
    }
    out
}

fn display_name(map: &Mapping, isa: Isa, objects: &Mapping, is_main_group: bool) -> String {
    match isa {
        Isa::PBXFileReference | Isa::PBXReferenceProxy => str_field(map, "name")
            .map(str::to_string)
            .or_else(|| str_field(map, "path").map(|p| basename(p).to_string()))
            .unwrap_or_else(|| isa_label(isa).to_string()),
        Isa::PBXGroup | Isa::PBXVariantGroup | Isa::XCVersionGroup => str_field(map, "name")
            .map(str::to_string)
            .or_else(|| str_field(map, "path").map(|p| basename(p).to_string()))
            .unwrap_or_else(|| if is_main_group { "<group>".to_string() } else { String::new() }),
        Isa::PBXNativeTarget | Isa::PBXAggregateTarget | Isa::PBXLegacyTarget | Isa::XCBuildConfiguration => {
            str_field(map, "name").map(str::to_string).unwrap_or_else(|| isa_label(isa).to_string())
        }
        // Xcode always annotates the PBXProject gid with this constant
        // literal, never the project name — the project name only shows
        // up in the XCConfigurationList owner comment (see the
        // `owner_configlist` handling above).
        Isa::PBXProject => "Project object".to_string(),
        Isa::PBXContainerItemProxy => "PBXContainerItemProxy".to_string(),
        Isa::PBXTargetDependency => map
            .get("target")
            .and_then(Value::as_str)
            .and_then(|g| objects.get(g))
            .and_then(Value::as_mapping)
            .and_then(|m| str_field(m, "name"))
            .map(str::to_string)
            .unwrap_or_else(|| "PBXTargetDependency".to_string()),
        Isa::XCSwiftPackageProductDependency => {
            str_field(map, "productName").map(str::to_string).unwrap_or_else(|| isa_label(isa).to_string())
        }
        Isa::XCRemoteSwiftPackageReference => {
            str_field(map, "repositoryURL").map(str::to_string).unwrap_or_else(|| isa_label(isa).to_string())
        }
        Isa::XCLocalSwiftPackageReference => {
            str_field(map, "relativePath").map(str::to_string).unwrap_or_else(|| isa_label(isa).to_string())
        }
        _ if isa.is_build_phase() => str_field(map, "name")
            .map(str::to_string)
            .unwrap_or_else(|| isa.default_build_phase_name().unwrap_or("").to_string()),
        _ => String::new(),
    }
}

fn isa_label(isa: Isa) -> &'static str {
    match isa {
        Isa::PBXFileReference => "PBXFileReference",
        Isa::PBXReferenceProxy => "PBXReferenceProxy",
        Isa::PBXNativeTarget => "PBXNativeTarget",
        Isa::PBXAggregateTarget => "PBXAggregateTarget",
        Isa::PBXLegacyTarget => "PBXLegacyTarget",
        Isa::XCBuildConfiguration => "XCBuildConfiguration",
        Isa::XCSwiftPackageProductDependency => "XCSwiftPackageProductDependency",
        Isa::XCRemoteSwiftPackageReference => "XCRemoteSwiftPackageReference",
        Isa::XCLocalSwiftPackageReference => "XCLocalSwiftPackageReference",
        _ => "",
    }
}

/// Keys whose gid-valued contents should never receive a trailing
/// comment (e.g. `TargetAttributes` maps target gids to attribute
/// dictionaries, but Xcode never comments those map keys).
pub fn is_no_comment_zone_key(key: &str) -> bool {
    key == "attributes" || key == "TargetAttributes"
}
