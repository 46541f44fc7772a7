use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PluginSearchError, Result};

const CONFIG_FILE: &str = "config.toml";
const CACHE_DIR: &str = "cache";

/// Cache entries older than this are refetched
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# plugin-search configuration file
# Location: ~/.plugin-search/config.toml

[cache]
# Seconds before a cached marketplace document is refetched
# Default: 3600
ttl_secs = 3600

# Cache directory (default: ~/.plugin-search/cache)
# dir = "/path/to/cache"

# Marketplaces are searched in the order listed here.
# base_url must point at a GitHub repository (its
# .claude-plugin/marketplace.json is fetched) or directly at a JSON document.

[[marketplaces]]
name = "claude-plugins-official"
base_url = "https://github.com/anthropics/claude-plugins-official"

[[marketplaces]]
name = "anthropics-skills"
base_url = "https://github.com/anthropics/skills"

[[marketplaces]]
name = "claude-code-templates"
base_url = "https://github.com/davila7/claude-code-templates"
"#;

/// A configured marketplace (registry source)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceSource {
    /// Identifier stamped on every plugin loaded from this marketplace
    pub name: String,
    /// Repository or document URL
    pub base_url: String,
}

impl MarketplaceSource {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }
}

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub marketplaces: Vec<MarketplaceSource>,
}

/// Cache-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Staleness threshold in seconds
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// Override for the cache directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            dir: None,
        }
    }
}

impl Config {
    /// Load config from base directory.
    ///
    /// Unlike most lookups in this crate, a missing or malformed config is
    /// an error: there is nothing to search without marketplaces.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let config = Self::load_unchecked(base_dir)?;
        config.validate()?;
        Ok(config)
    }

    /// Load without validating the marketplace list, so that an emptied
    /// config can still be edited
    pub fn load_unchecked(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Err(PluginSearchError::ConfigNotFound { path });
        }

        let content = fs::read_to_string(&path)?;
        Self::parse_unchecked(&content, &path)
    }

    /// Parse config content; `path` is only used for error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let config = Self::parse_unchecked(content, path)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_unchecked(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| PluginSearchError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.marketplaces.is_empty() {
            return Err(PluginSearchError::ConfigInvalid {
                message: "no marketplaces configured".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for marketplace in &self.marketplaces {
            validate_marketplace_name(&marketplace.name)?;
            if !seen.insert(marketplace.name.as_str()) {
                return Err(PluginSearchError::ConfigInvalid {
                    message: format!("duplicate marketplace name: {}", marketplace.name),
                });
            }
        }

        Ok(())
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Resolved cache directory
    pub fn cache_dir(&self, base_dir: &Path) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(|| base_dir.join(CACHE_DIR))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Find a marketplace by name
    pub fn marketplace(&self, name: &str) -> Option<&MarketplaceSource> {
        self.marketplaces.iter().find(|m| m.name == name)
    }

    /// Append a marketplace; names must stay unique
    pub fn add_marketplace(&mut self, source: MarketplaceSource) -> Result<()> {
        validate_marketplace_name(&source.name)?;
        if self.marketplace(&source.name).is_some() {
            return Err(PluginSearchError::ConfigInvalid {
                message: format!("marketplace already exists: {}", source.name),
            });
        }
        self.marketplaces.push(source);
        Ok(())
    }

    /// Remove a marketplace by name
    pub fn remove_marketplace(&mut self, name: &str) -> Result<MarketplaceSource> {
        validate_marketplace_name(name)?;
        let idx = self
            .marketplaces
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| PluginSearchError::ConfigInvalid {
                message: format!("marketplace not found: {}", name),
            })?;

        Ok(self.marketplaces.remove(idx))
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "cache.ttl_secs" => {
                self.cache.ttl_secs =
                    value
                        .trim()
                        .parse()
                        .map_err(|_| PluginSearchError::ConfigInvalid {
                            message: format!("cache.ttl_secs must be an integer: {}", value),
                        })?;
                Ok(())
            }
            "cache.dir" => {
                let trimmed = value.trim();
                self.cache.dir = if trimmed.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(trimmed))
                };
                Ok(())
            }
            _ => Err(PluginSearchError::ConfigInvalid {
                message: format!("unknown config key: {}", key),
            }),
        }
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            ("cache.ttl_secs".to_string(), self.cache.ttl_secs.to_string()),
            (
                "cache.dir".to_string(),
                self.cache
                    .dir
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            ),
        ];

        for marketplace in &self.marketplaces {
            entries.push((
                format!("marketplaces.{}", marketplace.name),
                marketplace.base_url.clone(),
            ));
        }

        entries
    }
}

/// Marketplace names double as cache file names
fn validate_marketplace_name(name: &str) -> Result<()> {
    let invalid = || PluginSearchError::InvalidMarketplaceName {
        name: name.to_string(),
    };

    if name.is_empty() || name.len() > 64 {
        return Err(invalid());
    }

    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid());
    }

    Ok(())
}
