//! Repository Module
//!
//! Maps plugin sources onto GitHub repositories and inspects them.
//!
//! - `reference`: declared source → repository + sub-path
//! - `inspector`: best-effort summary and tree facts

pub mod inspector;
pub mod reference;

// Re-exports
pub use inspector::{
    analyze_tree, RepositoryDetails, RepositoryFacts, RepositoryInspector, RepositorySummary,
    TreeEntry,
};
pub use reference::{
    inspect_target, marketplace_slug, parse_repository_url, resolve, InspectTarget,
    RepositoryRef, Resolution,
};
