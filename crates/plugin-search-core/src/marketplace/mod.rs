//! Marketplace Module
//!
//! Claude Code plugin marketplaces: download, cache, merge and filter.
//!
//! - `types`: `marketplace.json` schema and merged records
//! - `cache`: per-marketplace document cache with TTL
//! - `fetcher`: downloads documents into the cache
//! - `aggregator`: merges all configured marketplaces
//! - `filter`: marketplace / category / tag / free-text filtering

pub mod aggregator;
pub mod cache;
pub mod fetcher;
pub mod filter;
pub mod types;

// Re-exports
pub use aggregator::{Aggregate, Aggregator};
pub use cache::{is_fresh, is_fresh_at, RegistryCache};
pub use fetcher::{Endpoint, RegistryFetcher, MARKETPLACE_FILE};
pub use filter::{filter, find_by_names, list_categories, list_tags, FilterCriteria};
pub use types::{
    MarketplaceDocument, MarketplaceOwner, PluginEntry, PluginRecord, PluginSource,
    StructuredSource,
};
