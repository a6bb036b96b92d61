//! Koji hub client
//!
//! Talks XML-RPC to a Koji hub. Two calls are needed: `listPackages` to
//! derive the package set from the local hub, and per-package `listTagged`
//! queries for the latest build in a tag. Keyword arguments are passed the
//! way Koji clients do, as a trailing struct carrying `__starstar`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use tracing::debug;

use crate::source::xmlrpc::{self, Value};
use crate::source::{RetryPolicy, SourceError};

/// Client for one Koji hub instance.
pub struct KojiHub {
    client: Client,
    hub_url: String,
    retry: RetryPolicy,
}

impl KojiHub {
    pub fn new(hub_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            hub_url: hub_url.into(),
            retry,
        }
    }

    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, SourceError> {
        let body = xmlrpc::write_request(method, params);
        debug!("koji call {method} -> {}", self.hub_url);

        let body = &body;
        self.retry
            .run(method, || async move {
                let response = self
                    .client
                    .post(&self.hub_url)
                    .header("Content-Type", "text/xml")
                    .body(body.clone())
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::Status(status));
                }

                let text = response.text().await?;
                xmlrpc::parse_response(&text)
            })
            .await
    }

    /// Names of all non-blocked packages in a tag.
    pub async fn list_packages(&self, tag: &str) -> Result<BTreeSet<String>, SourceError> {
        let result = self
            .call(
                "listPackages",
                &[
                    Value::String(tag.to_string()),
                    kwargs([("inherited", Value::Bool(true))]),
                ],
            )
            .await?;

        let packages = result
            .as_array()
            .ok_or_else(|| SourceError::InvalidResponse("listPackages: not an array".into()))?;

        Ok(packages
            .iter()
            .filter(|pkg| pkg.get("blocked").and_then(Value::as_bool) != Some(true))
            .filter_map(|pkg| pkg.get("package_name").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// Version of the latest tagged build of one package, or `""` when the
    /// tag has no build of it.
    pub async fn latest_version(&self, tag: &str, package: &str) -> Result<String, SourceError> {
        let result = self
            .call(
                "listTagged",
                &[
                    Value::String(tag.to_string()),
                    kwargs([
                        ("package", Value::String(package.to_string())),
                        ("latest", Value::Bool(true)),
                        ("inherit", Value::Bool(true)),
                    ]),
                ],
            )
            .await?;

        let builds = result
            .as_array()
            .ok_or_else(|| SourceError::InvalidResponse("listTagged: not an array".into()))?;

        Ok(builds
            .first()
            .and_then(|build| build.get("version").and_then(Value::as_str))
            .unwrap_or_default()
            .to_string())
    }

    /// Latest versions for a whole package set, fanned out with bounded
    /// concurrency. Packages without a build map to `""`.
    pub async fn latest_versions(
        &self,
        tag: &str,
        packages: &BTreeSet<String>,
        concurrency: usize,
    ) -> Result<HashMap<String, String>, SourceError> {
        futures::stream::iter(packages.iter().map(|package| async move {
            let version = self.latest_version(tag, package).await?;
            Ok::<_, SourceError>((package.clone(), version))
        }))
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await
    }
}

fn kwargs<const N: usize>(pairs: [(&str, Value); N]) -> Value {
    let mut members = BTreeMap::from([("__starstar".to_string(), Value::Bool(true))]);
    for (name, value) in pairs {
        members.insert(name.to_string(), value);
    }
    Value::Struct(members)
}
