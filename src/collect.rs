//! Aggregation of all sources into one report
//!
//! The collector owns one client per source and fans the independent
//! network calls out: one future per release tag plus bounded per-package
//! streams for the upstream and bootstrap lookups. A package that fails on
//! a per-package source degrades to an empty entry; only losing the package
//! set itself aborts the run.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use chrono::Local;
use futures::StreamExt;
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::cache::UpstreamCache;
use crate::config::{Config, FETCH_STAGGER_DELAY_MS};
use crate::report::{PackageEntry, Report, VersionColumns};
use crate::source::comments::PackageNotes;
use crate::source::upstream::UpstreamSummary;
use crate::source::{
    BootstrapRepo, CommentsFile, GroupsEndpoint, KojiHub, ReleaseMonitoring, SourceError,
    VersionSource,
};

pub struct Collector {
    config: Config,
    fedora: KojiHub,
    mbi: KojiHub,
    upstream: ReleaseMonitoring,
    bootstrap: BootstrapRepo,
    comments: Option<CommentsFile>,
    groups: Option<GroupsEndpoint>,
    cache: UpstreamCache,
}

impl Collector {
    pub fn new(config: Config, cache: UpstreamCache) -> Self {
        let retry = config.retry;
        Self {
            fedora: KojiHub::new(config.fedora_hub.clone(), retry),
            mbi: KojiHub::new(config.mbi_hub.clone(), retry),
            upstream: ReleaseMonitoring::new(config.upstream_url.clone(), retry),
            bootstrap: BootstrapRepo::new(
                config.bootstrap_api_url.clone(),
                config.bootstrap_raw_url.clone(),
                retry,
            ),
            comments: config
                .comments_url
                .clone()
                .map(|url| CommentsFile::new(url, retry)),
            groups: config
                .groups_url
                .clone()
                .map(|url| GroupsEndpoint::new(url, retry)),
            cache,
            config,
        }
    }

    /// Collect versions from every source and assemble the report.
    pub async fn collect(&self) -> Result<Report, SourceError> {
        let groups = match &self.groups {
            Some(endpoint) => endpoint.fetch().await?,
            None => IndexMap::new(),
        };

        let packages: BTreeSet<String> = if groups.is_empty() {
            self.mbi.list_packages(&self.config.mbi_tag).await?
        } else {
            groups.values().flatten().cloned().collect()
        };
        info!("collecting versions for {} packages", packages.len());

        let (fedora, mbi, upstream, bootstrap, comments) = tokio::join!(
            self.fetch_fedora(&packages),
            self.mbi.latest_versions(
                &self.config.mbi_tag,
                &packages,
                self.config.fetch_concurrency
            ),
            self.fetch_upstream(&packages),
            self.fetch_bootstrap(&packages),
            self.fetch_comments(),
        );
        let fedora = fedora?;
        let mbi = mbi?;

        for name in comments.keys() {
            if !packages.contains(name) {
                warn!("package {name:?} has comments but is not part of the report");
            }
        }

        let versions = packages
            .iter()
            .map(|package| {
                let entry = PackageEntry {
                    fedora: self
                        .config
                        .fedora_releases
                        .iter()
                        .map(|release| {
                            let version = fedora
                                .get(release)
                                .and_then(|versions| versions.get(package))
                                .cloned()
                                .unwrap_or_default();
                            (release.clone(), version)
                        })
                        .collect(),
                    mbi: mbi.get(package).cloned().unwrap_or_default(),
                    jp_bootstrap: bootstrap.get(package).cloned().unwrap_or_default(),
                    upstream: upstream.get(package).cloned().unwrap_or_default(),
                    comments: comments.get(package).cloned().unwrap_or_default(),
                };
                (package.clone(), entry)
            })
            .collect();

        Ok(Report {
            time_generated: Local::now().format("%a %b %e %H:%M:%S %Y").to_string(),
            hostname: std::env::var("HOSTNAME").unwrap_or_else(|_| "local".to_string()),
            version_columns: VersionColumns {
                fedora: self.config.fedora_releases.clone(),
            },
            upstream_columns: vec!["latest".to_string(), "latest-stable".to_string()],
            versions,
            groups,
        })
    }

    async fn fetch_fedora(
        &self,
        packages: &BTreeSet<String>,
    ) -> Result<HashMap<String, HashMap<String, String>>, SourceError> {
        let columns =
            futures::future::try_join_all(self.config.fedora_releases.iter().map(|release| {
                async move {
                    let versions = self
                        .fedora
                        .latest_versions(release, packages, self.config.fetch_concurrency)
                        .await?;
                    info!("obtained {release} versions");
                    Ok::<_, SourceError>((release.clone(), versions))
                }
            }))
            .await?;

        Ok(columns.into_iter().collect())
    }

    async fn fetch_upstream(&self, packages: &BTreeSet<String>) -> BTreeMap<String, UpstreamSummary> {
        if let Some(cached) = self.cache.load_fresh() {
            return cached;
        }

        let summaries =
            summarize_upstream(&self.upstream, packages, self.config.fetch_concurrency).await;
        info!("obtained upstream versions");

        if let Err(err) = self.cache.store(&summaries) {
            warn!("cannot write upstream snapshot: {err}");
        }
        summaries
    }

    async fn fetch_bootstrap(&self, packages: &BTreeSet<String>) -> BTreeMap<String, String> {
        let known = match self.bootstrap.list_packages().await {
            Ok(known) => known,
            Err(err) => {
                warn!("cannot list bootstrap packages: {err}");
                return BTreeMap::new();
            }
        };

        futures::stream::iter(packages.iter().filter_map(|package| {
            let name = self.config.bootstrap_name(package);
            known.contains(name).then(|| async move {
                let version = match self.bootstrap.fetch_version(name).await {
                    Ok(version) => version,
                    Err(err) => {
                        warn!("jp-bootstrap: no version for {package}: {err}");
                        String::new()
                    }
                };
                (package.clone(), version)
            })
        }))
        .buffer_unordered(self.config.fetch_concurrency.max(1))
        .collect()
        .await
    }

    async fn fetch_comments(&self) -> BTreeMap<String, PackageNotes> {
        let Some(comments) = &self.comments else {
            return BTreeMap::new();
        };
        match comments.fetch().await {
            Ok(notes) => notes,
            Err(err) => {
                warn!("cannot fetch comments: {err}");
                BTreeMap::new()
            }
        }
    }
}

/// Summarize the upstream source for a whole package set with bounded
/// concurrency, staggering request starts. A package the source cannot
/// answer for gets an empty summary instead of failing the batch.
pub async fn summarize_upstream(
    source: &dyn VersionSource,
    packages: &BTreeSet<String>,
    concurrency: usize,
) -> BTreeMap<String, UpstreamSummary> {
    futures::stream::iter(packages.iter().enumerate().map(|(index, package)| {
        async move {
            tokio::time::sleep(Duration::from_millis(
                index as u64 * FETCH_STAGGER_DELAY_MS,
            ))
            .await;
            let summary = match source.fetch_raw_versions(package).await {
                Ok(versions) => UpstreamSummary::from_raw(package, &versions),
                Err(err) => {
                    warn!("{}: no usable data for {package}: {err}", source.name());
                    UpstreamSummary::default()
                }
            };
            (package.clone(), summary)
        }
    }))
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockVersionSource;

    // One package with a malformed entry, one the source cannot answer for
    // at all; the rest of the batch must still resolve.
    #[tokio::test]
    async fn summarize_upstream_tolerates_malformed_and_failing_packages() {
        let mut source = MockVersionSource::new();
        source.expect_name().return_const("fake");
        source
            .expect_fetch_raw_versions()
            .returning(|package| match package {
                "junit" => Ok(vec![
                    "5.0.0-M1".to_string(),
                    "not-a-version".to_string(),
                    "4.13.2".to_string(),
                ]),
                "maven" => Err(SourceError::NotFound("maven".to_string())),
                _ => Ok(vec!["1.0".to_string()]),
            });

        let packages = BTreeSet::from([
            "junit".to_string(),
            "maven".to_string(),
            "plexus-utils".to_string(),
        ]);
        let summaries = summarize_upstream(&source, &packages, 4).await;

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries["junit"].latest, "5.0.0~M1");
        assert_eq!(summaries["junit"].latest_stable.as_deref(), Some("4.13.2"));
        assert_eq!(summaries["maven"], UpstreamSummary::default());
        assert_eq!(summaries["plexus-utils"].latest, "1.0");
    }

    #[tokio::test]
    async fn summarize_upstream_handles_an_empty_package_set() {
        let mut source = MockVersionSource::new();
        source.expect_name().return_const("fake");
        source.expect_fetch_raw_versions().never();

        let summaries = summarize_upstream(&source, &BTreeSet::new(), 4).await;
        assert!(summaries.is_empty());
    }
}
