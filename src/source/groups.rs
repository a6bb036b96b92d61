//! Optional package-groups endpoint
//!
//! A JSON document of named package lists. When configured it both names
//! the groups shown in the report and defines the package set to collect.

use indexmap::IndexMap;
use reqwest::Client;
use serde::Deserialize;

use crate::source::{RetryPolicy, SourceError, check_status};

#[derive(Debug, Deserialize)]
struct GroupsResponse {
    groups: IndexMap<String, Vec<String>>,
}

/// Client for the groups document.
pub struct GroupsEndpoint {
    client: Client,
    url: String,
    retry: RetryPolicy,
}

impl GroupsEndpoint {
    pub fn new(url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            retry,
        }
    }

    pub async fn fetch(&self) -> Result<IndexMap<String, Vec<String>>, SourceError> {
        let response = self
            .retry
            .run("groups", || async move {
                let response = self.client.get(&self.url).send().await?;
                check_status(response, &self.url)
            })
            .await?;

        let groups: GroupsResponse = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

        Ok(groups.groups)
    }
}
