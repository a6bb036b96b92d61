//! Per-package comments file
//!
//! A hand-maintained file on the comments repository, one section per
//! package:
//!
//! ```text
//! # junit
//! ## keep-version: 4.13.2
//! Stays on 4.x until the test stack moves to junit5.
//! ---
//! ```
//!
//! `# name` opens a section, `## key: value` lines attach tags to it,
//! `---` (or the next section header) closes it; everything else inside a
//! section is free-form comment text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::source::{RetryPolicy, SourceError, check_status};

static TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s*(.*?)\s*:\s*(.*)$").expect("tag line pattern"));

/// Comment text and tags attached to one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageNotes {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,

    #[serde(flatten)]
    pub tags: BTreeMap<String, String>,
}

/// Client for the comments file.
pub struct CommentsFile {
    client: Client,
    url: String,
    retry: RetryPolicy,
}

impl CommentsFile {
    pub fn new(url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            retry,
        }
    }

    pub async fn fetch(&self) -> Result<BTreeMap<String, PackageNotes>, SourceError> {
        let response = self
            .retry
            .run("comments", || async move {
                let response = self.client.get(&self.url).send().await?;
                check_status(response, &self.url)
            })
            .await?;

        let text = response.text().await?;
        Ok(parse_comments(&text))
    }
}

/// Parse the comments file into per-package notes.
pub fn parse_comments(text: &str) -> BTreeMap<String, PackageNotes> {
    let mut result = BTreeMap::new();
    let mut name: Option<String> = None;
    let mut notes = PackageNotes::default();

    let mut flush = |name: &mut Option<String>, notes: &mut PackageNotes| {
        if let Some(name) = name.take() {
            notes.comment = notes.comment.trim_end().to_string();
            result.insert(name, std::mem::take(notes));
        }
    };

    for line in text.lines() {
        if let Some(header) = line.strip_prefix('#').filter(|rest| !rest.starts_with('#')) {
            flush(&mut name, &mut notes);
            name = Some(header.trim().to_string());
        } else if let Some(captures) = TAG_LINE.captures(line) {
            if name.is_some() {
                notes
                    .tags
                    .insert(captures[1].to_string(), captures[2].trim_end().to_string());
            }
        } else if line.starts_with("---") {
            flush(&mut name, &mut notes);
        } else if name.is_some() {
            notes.comment.push_str(line);
            notes.comment.push('\n');
        }
    }
    flush(&mut name, &mut notes);

    result
}
