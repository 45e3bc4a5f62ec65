//! Registry data shared by the rules and presentation adapters

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;

/// Metadata of one published version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMeta {
    /// Deprecation note, present only when the version is deprecated
    pub deprecated: Option<String>,
    /// Whether the registry holds a provenance attestation for the version
    pub provenance: bool,
}

/// Per-package registry snapshot, immutable once fetched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub dist_tags: HashMap<String, String>,
    /// Published versions in registry order (oldest first)
    pub versions_meta: IndexMap<String, VersionMeta>,
    /// Inverse of `dist_tags`
    pub version_to_tag: HashMap<String, String>,
}

impl PackageInfo {
    pub fn new(
        dist_tags: HashMap<String, String>,
        versions_meta: IndexMap<String, VersionMeta>,
    ) -> Self {
        let version_to_tag = dist_tags
            .iter()
            .map(|(tag, version)| (version.clone(), tag.clone()))
            .collect();

        Self {
            dist_tags,
            versions_meta,
            version_to_tag,
        }
    }

    pub fn latest(&self) -> Option<&str> {
        self.dist_tags.get("latest").map(String::as_str)
    }

    pub fn version_meta(&self, version: &str) -> Option<&VersionMeta> {
        self.versions_meta.get(version)
    }
}

/// Community replacement advisory for a package
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModuleReplacement {
    #[serde(rename_all = "camelCase")]
    Native {
        replacement: String,
        node_version: String,
        mdn_path: String,
    },
    Simple {
        replacement: String,
    },
    #[serde(rename_all = "camelCase")]
    Documented {
        doc_path: String,
    },
    None,
}

/// Known vulnerability affecting a specific version
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Advisory {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_builds_version_to_tag_index() {
        let info = PackageInfo::new(
            HashMap::from([
                ("latest".to_string(), "1.2.0".to_string()),
                ("next".to_string(), "2.0.0-beta.1".to_string()),
            ]),
            IndexMap::new(),
        );

        assert_eq!(info.version_to_tag.get("1.2.0").map(String::as_str), Some("latest"));
        assert_eq!(
            info.version_to_tag.get("2.0.0-beta.1").map(String::as_str),
            Some("next")
        );
        assert_eq!(info.latest(), Some("1.2.0"));
    }

    #[test]
    fn module_replacement_deserializes_every_kind() {
        let native: ModuleReplacement = serde_json::from_value(json!({
            "type": "native",
            "moduleName": "array-includes",
            "replacement": "Array.prototype.includes",
            "nodeVersion": "6.0.0",
            "mdnPath": "Global_Objects/Array/includes"
        }))
        .unwrap();
        assert_eq!(
            native,
            ModuleReplacement::Native {
                replacement: "Array.prototype.includes".to_string(),
                node_version: "6.0.0".to_string(),
                mdn_path: "Global_Objects/Array/includes".to_string(),
            }
        );

        let documented: ModuleReplacement =
            serde_json::from_value(json!({ "type": "documented", "docPath": "moment" })).unwrap();
        assert_eq!(
            documented,
            ModuleReplacement::Documented {
                doc_path: "moment".to_string()
            }
        );

        let none: ModuleReplacement =
            serde_json::from_value(json!({ "type": "none", "moduleName": "is-even" })).unwrap();
        assert_eq!(none, ModuleReplacement::None);
    }
}
