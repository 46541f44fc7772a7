//! Source resolution
//!
//! Maps a plugin's declared `source` onto the GitHub repository that holds
//! it, so the inspector knows what to look at.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::MarketplaceSource;
use crate::marketplace::types::{PluginRecord, PluginSource};

pub const DEFAULT_BRANCH: &str = "main";

/// `github.com/owner/repo` or `<sub>.githubusercontent.com/owner/repo`
static HOSTED_REPO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?(?:github\.com|[A-Za-z0-9-]+\.githubusercontent\.com)/([^/?#]+)/([^/?#]+)",
    )
    .expect("valid regex")
});

/// `github.com/owner/repo/tree/branch/...`
static TREE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?github\.com/([^/?#]+)/([^/?#]+)/tree/([^/?#]+)")
        .expect("valid regex")
});

/// `github.com/owner/repo`, optional `.git` and trailing separator
static REPO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?github\.com/([^/?#]+)/([^/?#]+?)(?:\.git)?(?:[/?#]|$)")
        .expect("valid regex")
});

/// A GitHub repository at a branch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
        }
    }

    /// `owner/repo`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Browser URL for the repository, or a path inside it
    pub fn web_url(&self, sub_path: &str) -> String {
        if sub_path.is_empty() {
            format!("https://github.com/{}/{}", self.owner, self.repo)
        } else {
            format!(
                "https://github.com/{}/{}/tree/{}/{}",
                self.owner, self.repo, self.branch, sub_path
            )
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.branch)
    }
}

/// Where a plugin lives: a repository and a path within it.
///
/// An empty `sub_path` means the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub reference: RepositoryRef,
    pub sub_path: String,
}

/// What the inspector should look at for a record.
///
/// `sub_path` is `None` when only the repository summary is wanted
/// (no tree walk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectTarget {
    pub reference: RepositoryRef,
    pub sub_path: Option<String>,
}

/// Parse a GitHub repository URL.
///
/// `/tree/<branch>` selects the branch; otherwise it is `main`.
pub fn parse_repository_url(url: &str) -> Option<RepositoryRef> {
    let url = url.trim();

    if let Some(caps) = TREE_URL.captures(url) {
        return Some(RepositoryRef::new(
            &caps[1],
            strip_git_suffix(&caps[2]),
            &caps[3],
        ));
    }

    REPO_URL
        .captures(url)
        .map(|caps| RepositoryRef::new(&caps[1], strip_git_suffix(&caps[2]), DEFAULT_BRANCH))
}

/// `owner/repo` of a marketplace base URL (github.com or githubusercontent)
fn hosted_owner_repo(base_url: &str) -> Option<(String, String)> {
    HOSTED_REPO.captures(base_url.trim()).map(|caps| {
        (
            caps[1].to_string(),
            strip_git_suffix(&caps[2]).to_string(),
        )
    })
}

/// `owner/repo` slug for `/plugin marketplace add`
pub fn marketplace_slug(base_url: &str) -> Option<String> {
    REPO_URL
        .captures(base_url.trim())
        .map(|caps| format!("{}/{}", &caps[1], strip_git_suffix(&caps[2])))
}

fn strip_git_suffix(repo: &str) -> &str {
    repo.strip_suffix(".git").unwrap_or(repo)
}

/// Strip leading `./` and `../` segments; `None` if the path is not relative
fn relative_sub_path(path: &str) -> Option<String> {
    if !path.starts_with("./") && !path.starts_with("../") {
        return None;
    }

    let mut rest = path;
    loop {
        if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix("../") {
            rest = r;
        } else {
            break;
        }
    }

    Some(rest.trim_end_matches('/').to_string())
}

/// Resolve a declared plugin source against its marketplace.
///
/// - `./path` / `../path`: `path` inside the marketplace repository, on `main`
/// - `{"source": "url", "url": ...}`: the repository root of `url`
/// - anything else: `None`
pub fn resolve(source: &PluginSource, marketplace: &MarketplaceSource) -> Option<Resolution> {
    match source {
        PluginSource::Relative(path) => {
            let sub_path = relative_sub_path(path)?;
            let (owner, repo) = hosted_owner_repo(&marketplace.base_url)?;
            Some(Resolution {
                reference: RepositoryRef::new(owner, repo, DEFAULT_BRANCH),
                sub_path,
            })
        }
        PluginSource::Structured(structured) if structured.source == "url" => {
            let url = structured.url.as_deref()?;
            // URL sources are inspected from the root regardless of any
            // trailing path in the URL
            parse_repository_url(url).map(|reference| Resolution {
                reference,
                sub_path: String::new(),
            })
        }
        _ => None,
    }
}

/// Pick the inspection target for a record.
///
/// Falls back to the record's homepage (summary only) when the declared
/// source does not resolve.
pub fn inspect_target(
    record: &PluginRecord,
    marketplace: Option<&MarketplaceSource>,
) -> Option<InspectTarget> {
    let resolved = record
        .entry
        .source
        .as_ref()
        .zip(marketplace)
        .and_then(|(source, marketplace)| resolve(source, marketplace));

    if let Some(resolution) = resolved {
        return Some(InspectTarget {
            reference: resolution.reference,
            sub_path: Some(resolution.sub_path),
        });
    }

    record
        .entry
        .homepage
        .as_deref()
        .and_then(parse_repository_url)
        .map(|reference| InspectTarget {
            reference,
            sub_path: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::types::{MarketplaceDocument, StructuredSource};

    fn widgets() -> MarketplaceSource {
        MarketplaceSource::new("acme", "https://github.com/acme/widgets")
    }

    fn url_source(url: &str) -> PluginSource {
        PluginSource::Structured(StructuredSource {
            source: "url".to_string(),
            url: Some(url.to_string()),
            repo: None,
            git_ref: None,
        })
    }

    #[test]
    fn test_resolve_relative_path() {
        let resolution =
            resolve(&PluginSource::Relative("./plugins/foo".to_string()), &widgets()).unwrap();

        assert_eq!(resolution.reference, RepositoryRef::new("acme", "widgets", "main"));
        assert_eq!(resolution.sub_path, "plugins/foo");
    }

    #[test]
    fn test_resolve_parent_relative_path() {
        let resolution =
            resolve(&PluginSource::Relative("../shared/bar/".to_string()), &widgets()).unwrap();
        assert_eq!(resolution.sub_path, "shared/bar");
    }

    #[test]
    fn test_resolve_relative_against_raw_host() {
        let marketplace = MarketplaceSource::new(
            "raw",
            "https://raw.githubusercontent.com/acme/widgets/main/.claude-plugin/marketplace.json",
        );
        let resolution =
            resolve(&PluginSource::Relative("./plugins/foo".to_string()), &marketplace).unwrap();
        assert_eq!(resolution.reference.slug(), "acme/widgets");
    }

    #[test]
    fn test_resolve_relative_unknown_host() {
        let marketplace = MarketplaceSource::new("other", "https://gitlab.com/acme/widgets");
        assert!(resolve(&PluginSource::Relative("./plugins/foo".to_string()), &marketplace).is_none());
    }

    #[test]
    fn test_resolve_non_relative_string() {
        assert!(resolve(&PluginSource::Relative("plugins/foo".to_string()), &widgets()).is_none());
    }

    #[test]
    fn test_resolve_url_source_inspects_root() {
        let source = url_source("https://github.com/acme/widgets/tree/dev/sub");
        let resolution = resolve(&source, &widgets()).unwrap();

        assert_eq!(resolution.reference, RepositoryRef::new("acme", "widgets", "dev"));
        assert_eq!(resolution.sub_path, "");
    }

    #[test]
    fn test_resolve_url_source_with_git_suffix() {
        let source = url_source("https://github.com/acme/gadgets.git");
        let resolution = resolve(&source, &widgets()).unwrap();
        assert_eq!(resolution.reference, RepositoryRef::new("acme", "gadgets", "main"));
    }

    #[test]
    fn test_resolve_other_shapes() {
        let github = PluginSource::Structured(StructuredSource {
            source: "github".to_string(),
            url: None,
            repo: Some("acme/widgets".to_string()),
            git_ref: None,
        });
        assert!(resolve(&github, &widgets()).is_none());
        assert!(resolve(&url_source("https://example.com/acme/widgets"), &widgets()).is_none());
        assert!(resolve(&PluginSource::Other(serde_json::json!(7)), &widgets()).is_none());
    }

    #[test]
    fn test_parse_repository_urls() {
        assert_eq!(
            parse_repository_url("https://github.com/acme/widgets"),
            Some(RepositoryRef::new("acme", "widgets", "main"))
        );
        assert_eq!(
            parse_repository_url("https://github.com/acme/widgets/"),
            Some(RepositoryRef::new("acme", "widgets", "main"))
        );
        assert_eq!(
            parse_repository_url("https://github.com/acme/widgets/tree/release-1/docs"),
            Some(RepositoryRef::new("acme", "widgets", "release-1"))
        );
        assert_eq!(parse_repository_url("https://github.com/acme"), None);
        assert_eq!(parse_repository_url("https://docs.acme.dev/widgets"), None);
    }

    #[test]
    fn test_marketplace_slugs() {
        assert_eq!(
            marketplace_slug("https://github.com/anthropics/claude-plugins-official.git"),
            Some("anthropics/claude-plugins-official".to_string())
        );
        assert_eq!(marketplace_slug("https://example.com/market.json"), None);
    }

    #[test]
    fn test_inspect_target_prefers_source_then_homepage() {
        let doc = MarketplaceDocument::parse(
            r#"{"plugins": [
                {"name": "a", "source": "./plugins/a"},
                {"name": "b", "source": {"source": "github", "repo": "x/y"},
                 "homepage": "https://github.com/acme/b-home"},
                {"name": "c"}
            ]}"#,
        )
        .unwrap();
        let marketplace = widgets();
        let records: Vec<_> = doc
            .plugins
            .into_iter()
            .map(|p| PluginRecord::new(p, "acme", "Acme"))
            .collect();

        let a = inspect_target(&records[0], Some(&marketplace)).unwrap();
        assert_eq!(a.sub_path.as_deref(), Some("plugins/a"));

        let b = inspect_target(&records[1], Some(&marketplace)).unwrap();
        assert_eq!(b.reference.slug(), "acme/b-home");
        assert!(b.sub_path.is_none());

        assert!(inspect_target(&records[2], Some(&marketplace)).is_none());
        assert!(inspect_target(&records[0], None).is_none());
    }

    #[test]
    fn test_web_urls() {
        let reference = RepositoryRef::new("acme", "widgets", "main");
        assert_eq!(reference.web_url(""), "https://github.com/acme/widgets");
        assert_eq!(
            reference.web_url("plugins/foo"),
            "https://github.com/acme/widgets/tree/main/plugins/foo"
        );
        assert_eq!(reference.to_string(), "acme/widgets@main");
    }
}
