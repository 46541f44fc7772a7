//! Repository inspector
//!
//! Best-effort GitHub lookups for the detail view: popularity and freshness
//! from the repository summary, plus what a recursive tree listing says
//! about the plugin (MCP config, commands, skills). Failures degrade to
//! missing data and never abort a listing.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::http::{HttpClient, DOWNLOAD_TIMEOUT, SUMMARY_TIMEOUT};
use crate::repository::reference::{InspectTarget, RepositoryRef};

pub const GITHUB_API: &str = "https://api.github.com";

/// MCP server configuration file
pub const MARKER_FILE: &str = ".mcp.json";
const COMMANDS_DIR: &str = "commands/";
const SKILLS_DIR: &str = "skills/";
const SKILL_FILE: &str = "SKILL.md";

/// Repository summary facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySummary {
    pub stars: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub default_branch: String,
}

#[derive(Deserialize)]
struct RawSummary {
    #[serde(default)]
    stargazers_count: Option<u64>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    default_branch: Option<String>,
}

impl From<RawSummary> for RepositorySummary {
    fn from(raw: RawSummary) -> Self {
        Self {
            stars: raw.stargazers_count.unwrap_or(0),
            updated_at: raw
                .updated_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            default_branch: raw
                .default_branch
                .unwrap_or_else(|| crate::repository::reference::DEFAULT_BRANCH.to_string()),
        }
    }
}

/// One entry of a git tree listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    #[serde(default)]
    pub path: String,
    /// "blob" or "tree"
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl TreeEntry {
    pub fn blob(path: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: "blob".to_string(),
        }
    }

    pub fn tree(path: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: "tree".to_string(),
        }
    }

    fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

/// What the tree listing says about a plugin directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryFacts {
    pub has_mcp: bool,
    /// Files directly under `commands/`, sorted
    pub commands: Vec<String>,
    /// Directories (relative to `skills/`) holding a `SKILL.md`, sorted
    pub skills: Vec<String>,
}

/// Summary plus tree facts (facts only when a sub-path was given)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDetails {
    pub reference: RepositoryRef,
    pub summary: RepositorySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<RepositoryFacts>,
}

/// Analyze a tree listing rooted at `sub_path` ("" for the repository root)
pub fn analyze_tree(entries: &[TreeEntry], sub_path: &str) -> RepositoryFacts {
    let prefix = match sub_path.trim_end_matches('/') {
        "" => String::new(),
        trimmed => format!("{}/", trimmed),
    };

    let mut facts = RepositoryFacts::default();
    let mut skills = BTreeSet::new();

    for entry in entries {
        let Some(relative) = entry.path.strip_prefix(prefix.as_str()) else {
            continue;
        };

        if relative == MARKER_FILE || relative.ends_with(&format!("/{}", MARKER_FILE)) {
            facts.has_mcp = true;
        }

        if let Some(rest) = relative.strip_prefix(COMMANDS_DIR) {
            if !rest.is_empty() && !rest.contains('/') && entry.is_blob() {
                facts.commands.push(rest.to_string());
            }
        }

        // skills/<name>/SKILL.md or skills/<vendor>/<name>/SKILL.md
        if let Some(rest) = relative.strip_prefix(SKILLS_DIR) {
            if let Some((dir, file)) = rest.rsplit_once('/') {
                if file == SKILL_FILE && !dir.is_empty() {
                    skills.insert(dir.to_string());
                }
            }
        }
    }

    facts.commands.sort();
    facts.skills = skills.into_iter().collect();
    facts
}

/// GitHub repository inspector
pub struct RepositoryInspector<'a, C: HttpClient> {
    http: &'a C,
    api_base: String,
}

impl<'a, C: HttpClient> RepositoryInspector<'a, C> {
    pub fn new(http: &'a C) -> Self {
        Self {
            http,
            api_base: GITHUB_API.to_string(),
        }
    }

    /// Point at a different API host (GitHub Enterprise, tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn summary_url(&self, reference: &RepositoryRef) -> String {
        format!("{}/repos/{}/{}", self.api_base, reference.owner, reference.repo)
    }

    pub fn tree_url(&self, reference: &RepositoryRef) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, reference.owner, reference.repo, reference.branch
        )
    }

    pub fn fetch_summary(&self, reference: &RepositoryRef) -> Result<RepositorySummary, FetchError> {
        let body = self.http.get(&self.summary_url(reference), SUMMARY_TIMEOUT)?;
        let raw: RawSummary =
            serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;
        Ok(raw.into())
    }

    pub fn fetch_tree(&self, reference: &RepositoryRef) -> Result<Vec<TreeEntry>, FetchError> {
        let body = self.http.get(&self.tree_url(reference), DOWNLOAD_TIMEOUT)?;
        let response: TreeResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

        if response.truncated {
            tracing::debug!(%reference, "tree listing truncated by GitHub");
        }

        Ok(response.tree)
    }

    /// Repository summary, or `None` on any failure
    pub fn inspect_summary(&self, reference: &RepositoryRef) -> Option<RepositorySummary> {
        match self.fetch_summary(reference) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::debug!(%reference, error = %e, "repository summary unavailable");
                None
            }
        }
    }

    /// Tree facts for `sub_path`; empty facts on any failure
    pub fn inspect_tree(&self, reference: &RepositoryRef, sub_path: &str) -> RepositoryFacts {
        match self.fetch_tree(reference) {
            Ok(entries) => analyze_tree(&entries, sub_path),
            Err(e) => {
                tracing::debug!(%reference, error = %e, "repository tree unavailable");
                RepositoryFacts::default()
            }
        }
    }

    /// Summary, plus tree facts when the target carries a sub-path.
    ///
    /// `None` when the summary itself is unavailable.
    pub fn inspect(&self, target: &InspectTarget) -> Option<RepositoryDetails> {
        let summary = self.inspect_summary(&target.reference)?;
        let facts = target
            .sub_path
            .as_deref()
            .map(|sub_path| self.inspect_tree(&target.reference, sub_path));

        Some(RepositoryDetails {
            reference: target.reference.clone(),
            summary,
            facts,
        })
    }
}
