//! Registry fetcher
//!
//! Downloads a marketplace document and commits it to the registry cache.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::config::MarketplaceSource;
use crate::error::{FetchError, PluginSearchError, Result};
use crate::http::{HttpClient, DOWNLOAD_TIMEOUT};
use crate::marketplace::cache::RegistryCache;
use crate::repository::inspector::GITHUB_API;
use crate::repository::reference::parse_repository_url;

/// Location of the marketplace document inside a marketplace repository
pub const MARKETPLACE_FILE: &str = ".claude-plugin/marketplace.json";

/// Where a marketplace document is downloaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// GitHub contents API; the document is base64 in the `content` field
    GitHubContents(String),
    /// Plain URL serving the document itself
    Direct(String),
}

impl Endpoint {
    pub fn url(&self) -> &str {
        match self {
            Self::GitHubContents(url) | Self::Direct(url) => url,
        }
    }
}

#[derive(Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Registry Fetcher - downloads marketplace documents to the cache
pub struct RegistryFetcher<'a, C: HttpClient> {
    http: &'a C,
    cache: &'a RegistryCache,
    api_base: String,
}

impl<'a, C: HttpClient> RegistryFetcher<'a, C> {
    pub fn new(http: &'a C, cache: &'a RegistryCache) -> Self {
        Self {
            http,
            cache,
            api_base: GITHUB_API.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Resolve the download endpoint for a marketplace base URL
    pub fn endpoint(&self, base_url: &str) -> std::result::Result<Endpoint, FetchError> {
        let base_url = base_url.trim();

        let is_repository = base_url.contains("://github.com/")
            || base_url.contains("://www.github.com/")
            || base_url.starts_with("github.com/");
        if is_repository {
            if let Some(reference) = parse_repository_url(base_url) {
                return Ok(Endpoint::GitHubContents(format!(
                    "{}/repos/{}/{}/contents/{}",
                    self.api_base, reference.owner, reference.repo, MARKETPLACE_FILE
                )));
            }
        }

        if base_url.starts_with("https://") || base_url.starts_with("http://") {
            return Ok(Endpoint::Direct(base_url.to_string()));
        }

        Err(FetchError::InvalidEndpoint(base_url.to_string()))
    }

    /// Download a marketplace document.
    ///
    /// The returned text is guaranteed to be well-formed JSON; entry-level
    /// oddities are left to the lenient document parser.
    pub fn fetch(&self, source: &MarketplaceSource) -> std::result::Result<String, FetchError> {
        let endpoint = self.endpoint(&source.base_url)?;
        tracing::debug!(marketplace = %source.name, url = endpoint.url(), "fetching marketplace");

        let body = self.http.get(endpoint.url(), DOWNLOAD_TIMEOUT)?;
        let document = match endpoint {
            Endpoint::GitHubContents(_) => decode_contents(&body)?,
            Endpoint::Direct(_) => body,
        };

        serde_json::from_str::<Value>(&document).map_err(|e| FetchError::Malformed(e.to_string()))?;
        Ok(document)
    }

    /// Download a marketplace document and replace its cache entry.
    ///
    /// On failure the existing cache file is left untouched.
    pub fn fetch_and_store(&self, source: &MarketplaceSource) -> Result<PathBuf> {
        let document = self.fetch(source).map_err(|error| PluginSearchError::Fetch {
            source_name: source.name.clone(),
            error,
        })?;

        self.cache.store(&source.name, &document)
    }
}

/// Extract the file body from a GitHub contents API response
fn decode_contents(body: &str) -> std::result::Result<String, FetchError> {
    let response: ContentsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let encoded = response
        .content
        .ok_or_else(|| FetchError::Malformed("response missing 'content' field".to_string()))?;

    // GitHub wraps the base64 payload at 60 columns
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| FetchError::Malformed(format!("invalid base64 content: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| FetchError::Malformed(e.to_string()))
}
