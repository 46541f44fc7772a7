//! Plugin filtering
//!
//! Narrows the merged plugin list by marketplace, category, tags and a
//! free-text query, in that order.

use std::collections::{BTreeMap, BTreeSet};

use crate::marketplace::types::PluginRecord;

/// Filter criteria; empty fields are ignored
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Whitespace-separated terms; a plugin matches if ANY term matches
    pub query: Option<String>,
    pub category: Option<String>,
    /// A plugin matches if it has ANY of these tags
    pub tags: Vec<String>,
    pub marketplace: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        non_empty(&self.query).is_none()
            && non_empty(&self.category).is_none()
            && wanted_tags(&self.tags).is_empty()
            && non_empty(&self.marketplace).is_none()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Apply `criteria` to `records`, preserving order
pub fn filter<'a>(records: &'a [PluginRecord], criteria: &FilterCriteria) -> Vec<&'a PluginRecord> {
    let mut results: Vec<&PluginRecord> = records.iter().collect();

    if let Some(marketplace) = non_empty(&criteria.marketplace) {
        let marketplace = marketplace.to_lowercase();
        results.retain(|p| p.marketplace.to_lowercase() == marketplace);
    }

    if let Some(category) = non_empty(&criteria.category) {
        let category = category.to_lowercase();
        results.retain(|p| p.entry.category.to_lowercase() == category);
    }

    let wanted = wanted_tags(&criteria.tags);
    if !wanted.is_empty() {
        results.retain(|p| has_any_tag(p, &wanted));
    }

    if let Some(query) = non_empty(&criteria.query) {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        results.retain(|p| matches_query(p, &terms));
    }

    results
}

/// Lower-cased tags, blanks dropped
fn wanted_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn has_any_tag(plugin: &PluginRecord, wanted: &[String]) -> bool {
    plugin
        .entry
        .tags
        .iter()
        .any(|tag| wanted.contains(&tag.to_lowercase()))
}

/// Lower-cased text searched by the free-text query
fn searchable_text(plugin: &PluginRecord) -> String {
    let entry = &plugin.entry;
    format!(
        "{} {} {} {} {}",
        entry.name,
        entry.description,
        entry.category,
        entry.tags.join(" "),
        entry.keywords.join(" ")
    )
    .to_lowercase()
}

fn matches_query(plugin: &PluginRecord, terms: &[String]) -> bool {
    let text = searchable_text(plugin);
    terms.iter().any(|term| text.contains(term.as_str()))
}

/// Plugins whose name matches one of `names` (case-insensitive)
pub fn find_by_names<'a>(records: &'a [PluginRecord], names: &[String]) -> Vec<&'a PluginRecord> {
    let wanted: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    records
        .iter()
        .filter(|p| wanted.contains(&p.entry.name.to_lowercase()))
        .collect()
}

/// Distinct categories with plugin counts, sorted by name
pub fn list_categories(records: &[PluginRecord]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        if !record.entry.category.is_empty() {
            *counts.entry(record.entry.category.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(category, count)| (category.to_string(), count))
        .collect()
}

/// Distinct tags, sorted
pub fn list_tags(records: &[PluginRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.entry.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::types::MarketplaceDocument;

    fn sample_records() -> Vec<PluginRecord> {
        let official = MarketplaceDocument::parse(
            r#"{
                "owner": {"name": "Anthropic"},
                "plugins": [
                    {
                        "name": "typescript-lsp",
                        "description": "TypeScript language server",
                        "category": "development",
                        "tags": ["typescript", "lsp", "API"]
                    },
                    {
                        "name": "issue-sync",
                        "description": "Sync issues with Linear",
                        "category": "Productivity",
                        "tags": ["issues"]
                    },
                    {
                        "name": "commit-commands",
                        "description": "Git commit workflow commands",
                        "category": "workflow",
                        "keywords": ["git", "vcs"]
                    }
                ]
            }"#,
        )
        .unwrap();
        let community = MarketplaceDocument::parse(
            r#"{"plugins": [
                {"name": "notion-export", "description": "Export pages", "category": "productivity", "tags": ["api"]}
            ]}"#,
        )
        .unwrap();

        let mut records: Vec<PluginRecord> = official
            .plugins
            .into_iter()
            .map(|p| PluginRecord::new(p, "official", "Anthropic"))
            .collect();
        records.extend(
            community
                .plugins
                .into_iter()
                .map(|p| PluginRecord::new(p, "Community", "Unknown")),
        );
        records
    }

    fn names(results: &[&PluginRecord]) -> Vec<String> {
        results.iter().map(|p| p.entry.name.clone()).collect()
    }

    #[test]
    fn test_empty_criteria_is_noop() {
        let records = sample_records();
        let criteria = FilterCriteria {
            query: Some("   ".to_string()),
            category: Some(String::new()),
            ..Default::default()
        };
        assert!(criteria.is_empty());
        assert_eq!(filter(&records, &criteria).len(), records.len());
    }

    #[test]
    fn test_query_or_semantics() {
        let records = sample_records();
        let criteria = FilterCriteria {
            query: Some("notion linear".to_string()),
            ..Default::default()
        };
        assert_eq!(
            names(&filter(&records, &criteria)),
            vec!["issue-sync", "notion-export"]
        );
    }

    #[test]
    fn test_query_matches_keywords_and_category() {
        let records = sample_records();
        let by_keyword = FilterCriteria {
            query: Some("VCS".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&filter(&records, &by_keyword)), vec!["commit-commands"]);

        let by_category = FilterCriteria {
            query: Some("workflow".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&filter(&records, &by_category)), vec!["commit-commands"]);
    }

    #[test]
    fn test_tags_case_insensitive_any() {
        let records = sample_records();
        let criteria = FilterCriteria {
            tags: vec!["API".to_string(), "nope".to_string()],
            ..Default::default()
        };
        assert_eq!(
            names(&filter(&records, &criteria)),
            vec!["typescript-lsp", "notion-export"]
        );
    }

    #[test]
    fn test_blank_tags_are_ignored() {
        let records = sample_records();
        let criteria = FilterCriteria {
            tags: vec![String::new(), "  ".to_string()],
            ..Default::default()
        };
        assert!(criteria.is_empty());
        assert_eq!(filter(&records, &criteria).len(), records.len());

        let criteria = FilterCriteria {
            tags: vec![String::new(), "lsp".to_string()],
            ..Default::default()
        };
        assert_eq!(names(&filter(&records, &criteria)), vec!["typescript-lsp"]);
    }

    #[test]
    fn test_category_case_insensitive() {
        let records = sample_records();
        let criteria = FilterCriteria {
            category: Some("PRODUCTIVITY".to_string()),
            ..Default::default()
        };
        assert_eq!(
            names(&filter(&records, &criteria)),
            vec!["issue-sync", "notion-export"]
        );
    }

    #[test]
    fn test_marketplace_then_query() {
        let records = sample_records();
        let criteria = FilterCriteria {
            marketplace: Some("community".to_string()),
            query: Some("export linear".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&filter(&records, &criteria)), vec!["notion-export"]);
    }

    #[test]
    fn test_find_by_names() {
        let records = sample_records();
        let found = find_by_names(&records, &["Notion-Export".to_string(), "missing".to_string()]);
        assert_eq!(names(&found), vec!["notion-export"]);
    }

    #[test]
    fn test_list_categories_and_tags() {
        let records = sample_records();
        assert_eq!(
            list_categories(&records),
            vec![
                ("Productivity".to_string(), 1),
                ("development".to_string(), 1),
                ("productivity".to_string(), 1),
                ("workflow".to_string(), 1),
            ]
        );
        assert_eq!(
            list_tags(&records),
            vec!["API", "api", "issues", "lsp", "typescript"]
        );
    }
}
