//! Registry cache
//!
//! One JSON file per marketplace under the cache directory, refreshed when
//! its modification time is older than the configured TTL.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::Result;
use crate::marketplace::types::MarketplaceDocument;

const CACHE_EXTENSION: &str = "json";

/// Returns true only if `path` exists and was written within `ttl`.
pub fn is_fresh(path: &Path, ttl: Duration) -> bool {
    is_fresh_at(path, ttl, SystemTime::now())
}

/// [`is_fresh`] against an explicit clock
pub fn is_fresh_at(path: &Path, ttl: Duration, now: SystemTime) -> bool {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return false,
    };

    // mtime in the future counts as age zero
    let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
    age <= ttl
}

/// Per-marketplace document cache
#[derive(Debug, Clone)]
pub struct RegistryCache {
    dir: PathBuf,
}

impl RegistryCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a marketplace
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, CACHE_EXTENSION))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    pub fn is_fresh(&self, name: &str, ttl: Duration) -> bool {
        is_fresh(&self.path_for(name), ttl)
    }

    /// Replace the cached document for `name`.
    ///
    /// Written to a sibling temp file then renamed over the old one, so a
    /// reader never sees a half-written document.
    pub fn store(&self, name: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(name);
        let tmp = self.dir.join(format!(".{}.{}.tmp", name, CACHE_EXTENSION));
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;

        Ok(path)
    }

    /// Read and parse the cached document for `name`
    pub fn load(&self, name: &str) -> Result<MarketplaceDocument> {
        let path = self.path_for(name);
        let content = fs::read_to_string(&path)?;
        MarketplaceDocument::parse_at(&content, &path)
    }

    /// Delete the cached document, if any
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginSearchError;
    use tempfile::TempDir;

    const TTL: Duration = Duration::from_secs(3600);

    fn create_test_cache() -> (RegistryCache, TempDir) {
        let temp = TempDir::new().unwrap();
        let cache = RegistryCache::new(temp.path().join("cache"));
        (cache, temp)
    }

    #[test]
    fn test_missing_file_is_stale() {
        let (cache, _temp) = create_test_cache();
        assert!(!cache.is_fresh("official", TTL));
        assert!(!is_fresh(&cache.path_for("official"), Duration::MAX));
    }

    #[test]
    fn test_fresh_within_ttl_and_stale_past_it() {
        let (cache, _temp) = create_test_cache();
        let path = cache.store("official", r#"{"plugins": []}"#).unwrap();
        let mtime = fs::metadata(&path).unwrap().modified().unwrap();

        assert!(is_fresh_at(&path, TTL, mtime));
        assert!(is_fresh_at(&path, TTL, mtime + TTL));
        assert!(!is_fresh_at(&path, TTL, mtime + TTL + Duration::from_secs(1)));
    }

    #[test]
    fn test_future_mtime_is_fresh() {
        let (cache, _temp) = create_test_cache();
        let path = cache.store("official", "{}").unwrap();
        let mtime = fs::metadata(&path).unwrap().modified().unwrap();

        assert!(is_fresh_at(&path, Duration::ZERO, mtime - Duration::from_secs(60)));
    }

    #[test]
    fn test_store_creates_dir_and_replaces() {
        let (cache, _temp) = create_test_cache();
        assert!(!cache.dir().exists());

        cache.store("m", r#"{"plugins": [{"name": "one"}]}"#).unwrap();
        cache.store("m", r#"{"plugins": [{"name": "two"}]}"#).unwrap();

        let doc = cache.load("m").unwrap();
        assert_eq!(doc.plugins.len(), 1);
        assert_eq!(doc.plugins[0].name, "two");

        let leftovers: Vec<_> = fs::read_dir(cache.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_load_malformed() {
        let (cache, _temp) = create_test_cache();
        cache.store("broken", "{not json").unwrap();

        let err = cache.load("broken").unwrap_err();
        assert!(matches!(err, PluginSearchError::Parse { .. }));
    }

    #[test]
    fn test_remove() {
        let (cache, _temp) = create_test_cache();
        cache.store("m", "{}").unwrap();
        assert!(cache.exists("m"));

        cache.remove("m").unwrap();
        assert!(!cache.exists("m"));
        cache.remove("m").unwrap();
    }
}
