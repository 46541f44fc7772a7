pub mod config;
pub mod error;
pub mod http;
pub mod marketplace;
pub mod repository;

pub use config::{Config, MarketplaceSource, DEFAULT_CACHE_TTL_SECS};
pub use error::{FetchError, PluginSearchError, Result};
pub use http::{HttpClient, ReqwestClient};
pub use marketplace::{
    filter, find_by_names, list_categories, list_tags, Aggregate, Aggregator, FilterCriteria,
    MarketplaceDocument, PluginEntry, PluginRecord, PluginSource, RegistryCache, RegistryFetcher,
};
pub use repository::{
    inspect_target, marketplace_slug, parse_repository_url, resolve, InspectTarget,
    RepositoryDetails, RepositoryFacts, RepositoryInspector, RepositoryRef, RepositorySummary,
    Resolution,
};
