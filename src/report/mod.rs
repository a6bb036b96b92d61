//! The merged version report
//!
//! One JSON document carrying every collected version, plus the HTML
//! comparison table rendered from it.

pub mod html;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::source::comments::PackageNotes;
use crate::source::upstream::UpstreamSummary;

/// The complete report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "time-generated")]
    pub time_generated: String,

    pub hostname: String,

    #[serde(rename = "version-columns")]
    pub version_columns: VersionColumns,

    #[serde(rename = "upstream-columns")]
    pub upstream_columns: Vec<String>,

    pub versions: IndexMap<String, PackageEntry>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub groups: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionColumns {
    pub fedora: Vec<String>,
}

/// All versions collected for one package, one field per source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageEntry {
    /// Release tag -> version, in column order; `""` where the release has
    /// no build
    #[serde(default)]
    pub fedora: IndexMap<String, String>,

    /// Latest build in the MBI tag
    #[serde(default)]
    pub mbi: String,

    /// Version recorded in the bootstrap repository, `""` when the package
    /// is not bootstrapped
    #[serde(rename = "jp-bootstrap", default)]
    pub jp_bootstrap: String,

    /// Canonical upstream versions
    #[serde(default)]
    pub upstream: UpstreamSummary,

    #[serde(default)]
    pub comments: PackageNotes,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        Ok(content)
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> Report {
        Report {
            time_generated: "Wed Aug  5 12:00:00 2026".to_string(),
            hostname: "builder".to_string(),
            version_columns: VersionColumns {
                fedora: vec!["f41".to_string(), "f42".to_string()],
            },
            upstream_columns: vec!["latest".to_string(), "latest-stable".to_string()],
            versions: IndexMap::from([(
                "junit".to_string(),
                PackageEntry {
                    fedora: IndexMap::from([
                        ("f41".to_string(), "4.13.2".to_string()),
                        ("f42".to_string(), "4.13.2".to_string()),
                    ]),
                    mbi: "4.13.2".to_string(),
                    jp_bootstrap: "4.13.2".to_string(),
                    upstream: UpstreamSummary {
                        latest: "5.0.0~M1".to_string(),
                        latest_stable: Some("4.13.2".to_string()),
                    },
                    comments: PackageNotes::default(),
                },
            )]),
            groups: IndexMap::new(),
        }
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = sample_report();
        let json = report.to_json().unwrap();

        assert_eq!(Report::from_json(&json).unwrap(), report);
    }

    #[test]
    fn report_serializes_the_documented_keys() {
        let json = sample_report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["time-generated"], "Wed Aug  5 12:00:00 2026");
        assert_eq!(value["version-columns"]["fedora"][1], "f42");
        assert_eq!(value["versions"]["junit"]["jp-bootstrap"], "4.13.2");
        assert_eq!(
            value["versions"]["junit"]["upstream"]["latest-stable"],
            "4.13.2"
        );
        // No groups were collected, so the key is absent entirely
        assert!(value.get("groups").is_none());
    }

    #[test]
    fn upstream_without_stable_omits_the_column() {
        let mut report = sample_report();
        report.versions["junit"].upstream.latest_stable = None;

        let value: serde_json::Value =
            serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value["versions"]["junit"]["upstream"].get("latest-stable").is_none());
    }
}
