use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::source::RetryPolicy;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default age limit for the upstream snapshot in seconds (1 hour)
pub const DEFAULT_CACHE_MAX_AGE_SECS: i64 = 60 * 60;

/// Number of per-package requests in flight at once
pub const DEFAULT_FETCH_CONCURRENCY: usize = 30;

/// Delay between starting each per-package fetch to avoid rate limiting (10ms)
pub const FETCH_STAGGER_DELAY_MS: u64 = 10;

/// Tool configuration, optionally loaded from a JSON file. Every field has
/// a default matching the production deployment, so a partial file only
/// needs to name what it changes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Fedora Koji hub, one version column per entry of `fedora_releases`
    pub fedora_hub: String,
    pub fedora_releases: Vec<String>,

    /// The MBI hub; its tag also defines the package set unless a groups
    /// endpoint is configured
    pub mbi_hub: String,
    pub mbi_tag: String,

    pub upstream_url: String,
    pub bootstrap_api_url: String,
    pub bootstrap_raw_url: String,
    pub comments_url: Option<String>,
    pub groups_url: Option<String>,

    pub cache_max_age_secs: i64,
    pub fetch_concurrency: usize,
    pub retry: RetryPolicy,

    /// Package name translation between the distribution and the bootstrap
    /// repository. Immutable for the lifetime of a run; passed to whoever
    /// needs the translation instead of living in a process-wide table.
    pub bootstrap_names: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fedora_hub: "https://koji.fedoraproject.org/kojihub".to_string(),
            fedora_releases: vec!["f40".to_string(), "f41".to_string(), "f42".to_string()],
            mbi_hub: "https://koji.kjnet.xyz/kojihub".to_string(),
            mbi_tag: "jp".to_string(),
            upstream_url: crate::source::upstream::DEFAULT_UPSTREAM_URL.to_string(),
            bootstrap_api_url: crate::source::bootstrap::DEFAULT_BOOTSTRAP_API_URL.to_string(),
            bootstrap_raw_url: crate::source::bootstrap::DEFAULT_BOOTSTRAP_RAW_URL.to_string(),
            comments_url: Some(
                "https://pagure.io/java-pkg-versions-comments/raw/master/f/comments.md"
                    .to_string(),
            ),
            groups_url: None,
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            retry: RetryPolicy::default(),
            bootstrap_names: default_bootstrap_names(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("cannot parse configuration file {}", path.display()))
    }

    /// Bootstrap repository name for a distribution package name.
    pub fn bootstrap_name<'a>(&'a self, package: &'a str) -> &'a str {
        self.bootstrap_names
            .get(package)
            .map_or(package, String::as_str)
    }
}

/// Distribution package name -> javapackages-bootstrap project name, for
/// the packages whose names differ between the two.
fn default_bootstrap_names() -> BTreeMap<String, String> {
    [
        ("apache-commons-beanutils", "commons-beanutils"),
        ("apache-commons-cli", "commons-cli"),
        ("apache-commons-codec", "commons-codec"),
        ("apache-commons-collections", "commons-collections"),
        ("apache-commons-compress", "commons-compress"),
        ("apache-commons-io", "commons-io"),
        ("apache-commons-jxpath", "commons-jxpath"),
        ("apache-commons-lang3", "commons-lang"),
        ("apache-commons-logging", "commons-logging"),
        ("apache-commons-parent", "commons-parent-pom"),
        ("apache-parent", "apache-pom"),
        ("aqute-bnd", "bnd"),
        ("beust-jcommander", "jcommander"),
        ("felix-parent", "felix-parent-pom"),
        ("google-gson", "gson"),
        ("google-guice", "guice"),
        ("httpcomponents-project", "httpcomponents-parent-pom"),
        ("jakarta-activation1", "jaf-api"),
        ("jakarta-annotations", "common-annotations-api"),
        ("jakarta-cdi", "cdi"),
        ("jakarta-inject", "injection-api"),
        ("jakarta-mail", "mail-api"),
        ("jakarta-servlet", "servlet-api"),
        ("java_cup", "cup"),
        ("junit", "junit4"),
        ("maven-parent", "maven-parent-pom"),
        ("mojo-parent", "mojo-parent-pom"),
        ("objectweb-asm", "asm"),
        ("osgi-compendium", "osgi-cmpn"),
        ("velocity", "velocity-engine"),
        ("woodstox-core", "woodstox"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

/// Default location of the upstream snapshot.
/// Uses $XDG_CACHE_HOME/pkg-versions if XDG_CACHE_HOME is set,
/// otherwise falls back to ~/.cache/pkg-versions,
/// or ./pkg-versions if neither is available.
pub fn default_cache_file() -> PathBuf {
    cache_dir_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::home_dir())
        .join("upstream.json")
}

fn cache_dir_with_env(xdg_cache_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let cache_dir = xdg_cache_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."));

    cache_dir.join("pkg-versions")
}
