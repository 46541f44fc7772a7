//! Marketplace aggregation
//!
//! Loads every configured marketplace (refreshing stale caches) and merges
//! their plugins into one list tagged with marketplace and owner.

use std::time::Duration;

use tracing::warn;

use crate::config::MarketplaceSource;
use crate::http::HttpClient;
use crate::marketplace::cache::RegistryCache;
use crate::marketplace::fetcher::RegistryFetcher;
use crate::marketplace::types::PluginRecord;

/// Merged view over all configured marketplaces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    /// Plugins in marketplace order, then upstream order
    pub plugins: Vec<PluginRecord>,
    /// Number of configured marketplaces
    pub total: usize,
    /// Number of marketplaces whose plugins were merged
    pub loaded: usize,
}

impl Aggregate {
    /// Plugins loaded from the named marketplace
    pub fn count_for(&self, marketplace: &str) -> usize {
        self.plugins
            .iter()
            .filter(|p| p.marketplace == marketplace)
            .count()
    }
}

/// Drives fetcher and cache across all marketplaces
pub struct Aggregator<'a, C: HttpClient> {
    fetcher: RegistryFetcher<'a, C>,
    cache: &'a RegistryCache,
    ttl: Duration,
    force_refresh: bool,
}

impl<'a, C: HttpClient> Aggregator<'a, C> {
    pub fn new(http: &'a C, cache: &'a RegistryCache, ttl: Duration) -> Self {
        Self {
            fetcher: RegistryFetcher::new(http, cache),
            cache,
            ttl,
            force_refresh: false,
        }
    }

    /// Replace the fetcher (custom API base)
    pub fn with_fetcher(mut self, fetcher: RegistryFetcher<'a, C>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Refetch every marketplace regardless of cache age
    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    /// Load all marketplaces in order.
    ///
    /// A marketplace that can neither be fetched nor read from cache is
    /// skipped with a warning; it never aborts the run.
    pub fn load_all(&self, sources: &[MarketplaceSource]) -> Aggregate {
        let mut aggregate = Aggregate {
            total: sources.len(),
            ..Aggregate::default()
        };

        for source in sources {
            if let Some(records) = self.load_one(source) {
                aggregate.plugins.extend(records);
                aggregate.loaded += 1;
            }
        }

        aggregate
    }

    fn load_one(&self, source: &MarketplaceSource) -> Option<Vec<PluginRecord>> {
        let name = source.name.as_str();

        if self.force_refresh || !self.cache.is_fresh(name, self.ttl) {
            if let Err(e) = self.fetcher.fetch_and_store(source) {
                if self.cache.exists(name) {
                    warn!(marketplace = name, error = %e, "using cached data due to download failure");
                } else {
                    warn!(marketplace = name, error = %e, "skipping marketplace (download failed)");
                    return None;
                }
            }
        }

        let document = match self.cache.load(name) {
            Ok(document) => document,
            Err(e) => {
                warn!(marketplace = name, error = %e, "could not load marketplace");
                return None;
            }
        };

        let owner = document.owner_name().to_string();
        Some(
            document
                .plugins
                .into_iter()
                .map(|entry| PluginRecord::new(entry, name, &owner))
                .collect(),
        )
    }
}
