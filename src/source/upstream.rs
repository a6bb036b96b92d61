//! release-monitoring.org client
//!
//! Resolving an upstream version takes two API calls: the package endpoint
//! maps a Fedora package name to its upstream project, the project endpoint
//! lists the known versions, newest first.

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::source::{RetryPolicy, SourceError, VersionSource, check_status};
use crate::version::normalize;

pub const DEFAULT_UPSTREAM_URL: &str = "https://release-monitoring.org";

/// Client for the release-monitoring.org v2 API.
pub struct ReleaseMonitoring {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ReleaseMonitoring {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            retry,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
    ) -> Result<T, SourceError> {
        let response = self
            .retry
            .run(url, || async move {
                let response = self.client.get(url).send().await?;
                check_status(response, package)
            })
            .await?;

        response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct PackagesResponse {
    items: Vec<PackageItem>,
}

#[derive(Debug, Deserialize)]
struct PackageItem {
    project: String,
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    items: Vec<ProjectItem>,
}

#[derive(Debug, Deserialize)]
struct ProjectItem {
    versions: Vec<String>,
}

#[async_trait::async_trait]
impl VersionSource for ReleaseMonitoring {
    fn name(&self) -> &'static str {
        "release-monitoring"
    }

    async fn fetch_raw_versions(&self, package: &str) -> Result<Vec<String>, SourceError> {
        let url = format!(
            "{}/api/v2/packages/?name={package}&distribution=Fedora",
            self.base_url
        );
        debug!("fetching upstream project for {package}");

        let packages: PackagesResponse = self.get_json(&url, package).await?;
        let project = packages
            .items
            .first()
            .map(|item| item.project.clone())
            .ok_or_else(|| SourceError::NotFound(package.to_string()))?;

        let url = format!("{}/api/v2/projects/?name={project}", self.base_url);
        let projects: ProjectsResponse = self.get_json(&url, package).await?;

        projects
            .items
            .into_iter()
            .next()
            .map(|item| item.versions)
            .ok_or_else(|| SourceError::NotFound(project))
    }
}

/// The two upstream columns derived from a raw version list.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct UpstreamSummary {
    /// Newest known version, canonical form. Empty when the newest entry
    /// could not be normalized.
    #[serde(default)]
    pub latest: String,

    /// Newest version whose canonical form carries no pre-release tilde.
    /// Omitted when it coincides with `latest` or no such version exists.
    #[serde(
        rename = "latest-stable",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub latest_stable: Option<String>,
}

impl UpstreamSummary {
    /// Summarize a raw, newest-first version list. A version that fails
    /// normalization is logged and treated as absent; it never fails the
    /// package, let alone the whole report.
    pub fn from_raw(package: &str, versions: &[String]) -> Self {
        let latest = versions
            .first()
            .map(|raw| match normalize(raw) {
                Ok(canonical) => canonical,
                Err(err) => {
                    warn!("{package}: latest upstream version is unusable: {err}");
                    String::new()
                }
            })
            .unwrap_or_default();

        let mut latest_stable = None;
        for raw in versions {
            match normalize(raw) {
                Ok(canonical) if !canonical.contains('~') => {
                    latest_stable = Some(canonical);
                    break;
                }
                Ok(_) => {}
                Err(err) => warn!("{package}: skipping malformed upstream version: {err}"),
            }
        }
        if latest_stable.as_deref() == Some(latest.as_str()) {
            latest_stable = None;
        }

        Self {
            latest,
            latest_stable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn fetch_raw_versions_resolves_project_then_versions() {
        let mut server = Server::new_async().await;
        let package_mock = server
            .mock("GET", "/api/v2/packages/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "junit".into()),
                Matcher::UrlEncoded("distribution".into(), "Fedora".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"items": [{"project": "junit4"}]}"#)
            .create_async()
            .await;
        let project_mock = server
            .mock("GET", "/api/v2/projects/")
            .match_query(Matcher::UrlEncoded("name".into(), "junit4".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"items": [{"versions": ["4.13.2", "4.13-beta-1", "4.12"]}]}"#)
            .create_async()
            .await;

        let upstream = ReleaseMonitoring::new(server.url(), RetryPolicy::default());
        let versions = upstream.fetch_raw_versions("junit").await.unwrap();

        package_mock.assert_async().await;
        project_mock.assert_async().await;
        assert_eq!(versions, vec!["4.13.2", "4.13-beta-1", "4.12"]);
    }

    #[tokio::test]
    async fn fetch_raw_versions_reports_unknown_package() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v2/packages/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"items": []}"#)
            .create_async()
            .await;

        let upstream = ReleaseMonitoring::new(server.url(), RetryPolicy::default());
        let result = upstream.fetch_raw_versions("no-such-package").await;

        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn summary_takes_first_version_as_latest() {
        let versions = ["5.0.0-M1".to_string(), "4.13.2".to_string()];
        let summary = UpstreamSummary::from_raw("junit", &versions);

        assert_eq!(summary.latest, "5.0.0~M1");
        assert_eq!(summary.latest_stable.as_deref(), Some("4.13.2"));
    }

    #[test]
    fn summary_collapses_stable_equal_to_latest() {
        let versions = ["4.13.2".to_string(), "4.13.1".to_string()];
        let summary = UpstreamSummary::from_raw("junit", &versions);

        assert_eq!(summary.latest, "4.13.2");
        assert_eq!(summary.latest_stable, None);
    }

    // One malformed entry in a mixed list must not lose the valid ones.
    #[test]
    fn summary_skips_malformed_versions_in_mixed_list() {
        let versions = [
            "6.0-alpha-2".to_string(),
            "not-a-version".to_string(),
            "5.9.3".to_string(),
        ];
        let summary = UpstreamSummary::from_raw("junit", &versions);

        assert_eq!(summary.latest, "6.0~alpha.2");
        assert_eq!(summary.latest_stable.as_deref(), Some("5.9.3"));
    }

    #[test]
    fn summary_records_empty_latest_for_malformed_head() {
        let versions = ["not-a-version".to_string(), "1.2.3".to_string()];
        let summary = UpstreamSummary::from_raw("pkg", &versions);

        assert_eq!(summary.latest, "");
        assert_eq!(summary.latest_stable.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn summary_of_empty_list_is_empty() {
        assert_eq!(
            UpstreamSummary::from_raw("pkg", &[]),
            UpstreamSummary::default()
        );
    }
}
