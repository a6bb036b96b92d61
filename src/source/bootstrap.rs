//! javapackages-bootstrap repository client
//!
//! The bootstrap project keeps one `.properties` descriptor per packaged
//! project under `project/`. The directory listing comes from the GitHub
//! contents API, the version from the `version=` line of the raw file.

use std::collections::BTreeSet;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::source::{RetryPolicy, SourceError, VersionSource, check_status};

pub const DEFAULT_BOOTSTRAP_API_URL: &str =
    "https://api.github.com/repos/fedora-java/javapackages-bootstrap/contents/project";
pub const DEFAULT_BOOTSTRAP_RAW_URL: &str =
    "https://raw.githubusercontent.com/fedora-java/javapackages-bootstrap/master/project";

/// Client for the bootstrap project descriptors.
pub struct BootstrapRepo {
    client: Client,
    api_url: String,
    raw_url: String,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    name: String,
}

impl BootstrapRepo {
    pub fn new(
        api_url: impl Into<String>,
        raw_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client: Client::builder()
                .user_agent("pkg-versions")
                .build()
                .expect("Failed to create HTTP client"),
            api_url: api_url.into(),
            raw_url: raw_url.into(),
            retry,
        }
    }

    /// Names of all projects with a descriptor in the bootstrap repository.
    pub async fn list_packages(&self) -> Result<BTreeSet<String>, SourceError> {
        let response = self
            .retry
            .run("bootstrap listing", || async move {
                let response = self
                    .client
                    .get(&self.api_url)
                    .header("Accept", "application/vnd.github+json")
                    .send()
                    .await?;
                check_status(response, "project/")
            })
            .await?;

        let entries: Vec<DirectoryEntry> = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                entry
                    .name
                    .strip_suffix(".properties")
                    .map(str::to_string)
            })
            .collect())
    }

    /// Version recorded in one project descriptor.
    pub async fn fetch_version(&self, package: &str) -> Result<String, SourceError> {
        let url = format!("{}/{package}.properties", self.raw_url);
        debug!("fetching bootstrap descriptor {url}");

        let url = &url;
        let response = self
            .retry
            .run(url, || async move {
                let response = self.client.get(url).send().await?;
                check_status(response, package)
            })
            .await?;

        let content = response.text().await?;
        content
            .lines()
            .find_map(|line| line.strip_prefix("version="))
            .map(str::to_string)
            .ok_or_else(|| {
                SourceError::InvalidResponse(format!("{package}.properties has no version line"))
            })
    }
}

#[async_trait::async_trait]
impl VersionSource for BootstrapRepo {
    fn name(&self) -> &'static str {
        "jp-bootstrap"
    }

    async fn fetch_raw_versions(&self, package: &str) -> Result<Vec<String>, SourceError> {
        Ok(vec![self.fetch_version(package).await?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn repo(server: &Server) -> BootstrapRepo {
        BootstrapRepo::new(
            format!("{}/contents/project", server.url()),
            format!("{}/raw/project", server.url()),
            RetryPolicy::default(),
        )
    }

    #[tokio::test]
    async fn list_packages_keeps_only_property_descriptors() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/contents/project")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"name": "junit4.properties"},
                    {"name": "asm.properties"},
                    {"name": "README.md"}
                ]"#,
            )
            .create_async()
            .await;

        let packages = repo(&server).list_packages().await.unwrap();

        assert_eq!(
            packages,
            BTreeSet::from(["asm".to_string(), "junit4".to_string()])
        );
    }

    #[tokio::test]
    async fn fetch_version_reads_the_version_line() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/raw/project/junit4.properties")
            .with_status(200)
            .with_body("mbi.name=junit4\nversion=4.13.2\nrelease=1\n")
            .create_async()
            .await;

        let version = repo(&server).fetch_version("junit4").await.unwrap();

        mock.assert_async().await;
        assert_eq!(version, "4.13.2");
    }

    #[tokio::test]
    async fn fetch_version_reports_missing_descriptor() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/raw/project/nonexistent.properties")
            .with_status(404)
            .create_async()
            .await;

        let result = repo(&server).fetch_version("nonexistent").await;

        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn fetch_version_rejects_descriptor_without_version() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/raw/project/broken.properties")
            .with_status(200)
            .with_body("mbi.name=broken\n")
            .create_async()
            .await;

        let result = repo(&server).fetch_version("broken").await;

        assert!(matches!(result, Err(SourceError::InvalidResponse(_))));
    }
}
