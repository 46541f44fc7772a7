//! Marketplace document types
//!
//! Types for the `marketplace.json` documents published by Claude Code
//! plugin marketplaces, and the merged records built from them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{PluginSearchError, Result};

pub const UNKNOWN_OWNER: &str = "Unknown";
pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_DESCRIPTION: &str = "No description";
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// A marketplace document (parsed from marketplace.json)
///
/// Parsing is lenient: a field of the wrong type falls back to its default
/// and a `plugins` item that is not an object is dropped, so one odd entry
/// never hides the rest of the marketplace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketplaceDocument {
    /// Marketplace name as published upstream
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Owner information; anything that is not an object is ignored
    #[serde(default, deserialize_with = "lenient")]
    pub owner: Option<MarketplaceOwner>,
    /// Available plugins, in upstream order
    #[serde(default, deserialize_with = "lenient_plugins")]
    pub plugins: Vec<PluginEntry>,
}

impl MarketplaceDocument {
    /// Parse a document; only the top-level shape is checked
    pub fn parse(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Parse a document, attributing failures to `path`
    pub fn parse_at(content: &str, path: &std::path::Path) -> Result<Self> {
        Self::parse(content).map_err(|e| PluginSearchError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Owner label stamped on every record of this document
    pub fn owner_name(&self) -> &str {
        self.owner
            .as_ref()
            .and_then(|o| o.name.as_deref())
            .unwrap_or(UNKNOWN_OWNER)
    }
}

/// Marketplace owner information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceOwner {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
}

/// `None` for null or any value that does not fit `T`
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_plugins<'de, D>(deserializer: D) -> std::result::Result<Vec<PluginEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            tracing::debug!(value = %other, "ignoring non-array plugins field");
            return Ok(Vec::new());
        }
    };

    Ok(items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let entry = PluginEntry::from_value(item);
            if entry.is_none() {
                tracing::debug!(index, value = %item, "skipping non-object plugin entry");
            }
            entry
        })
        .collect())
}

/// Plugin entry in marketplace.json, with defaults filled at ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginEntry {
    pub name: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PluginSource>,
}

impl PluginEntry {
    /// Build an entry from one `plugins` item.
    ///
    /// `None` unless the item is an object. Missing, null or mistyped
    /// fields take their defaults; non-string list items are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;

        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
        let list = |key: &str| -> Vec<String> {
            fields
                .get(key)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };

        Some(Self {
            name: text("name").unwrap_or_else(|| DEFAULT_NAME.to_string()),
            description: text("description").unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            category: text("category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags: list("tags"),
            keywords: list("keywords"),
            homepage: text("homepage"),
            source: fields
                .get("source")
                .filter(|v| !v.is_null())
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        })
    }
}

/// Plugin source specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginSource {
    /// Relative path (e.g., "./plugins/my-plugin")
    Relative(String),
    /// Structured source
    Structured(StructuredSource),
    /// Any other shape; kept so one odd entry doesn't reject the document
    Other(serde_json::Value),
}

/// Structured source specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredSource {
    /// Source type: "url", "github", ...
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
}

/// A plugin entry tagged with the marketplace it was loaded from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginRecord {
    #[serde(flatten)]
    pub entry: PluginEntry,
    /// Name of the configured marketplace this record came from
    pub marketplace: String,
    /// Owner label from the marketplace document
    pub owner: String,
}

impl PluginRecord {
    pub fn new(entry: PluginEntry, marketplace: &str, owner: &str) -> Self {
        Self {
            entry,
            marketplace: marketplace.to_string(),
            owner: owner.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// Install identifier (name@marketplace)
    pub fn full_id(&self) -> String {
        format!("{}@{}", self.entry.name, self.marketplace)
    }
}
