//! Terminal rendering for search results and listings

use colored::Colorize;

use plugin_search_core::{
    marketplace_slug, Aggregate, MarketplaceSource, PluginRecord, RepositoryDetails,
};

const RULE_WIDTH: usize = 80;
const LIST_PREVIEW: usize = 5;

/// More detailed results than this triggers the narrowing tip
pub const TIP_THRESHOLD: usize = 3;

/// One-line summary: `name (category) [owner] - description`
pub fn compact(index: usize, plugin: &PluginRecord) -> String {
    format!(
        "{}. {} ({}) [{}] - {}",
        index.to_string().bold(),
        plugin.entry.name.cyan(),
        plugin.entry.category.dimmed(),
        plugin.owner.yellow(),
        plugin.entry.description
    )
}

/// `owner/repo` used for `/plugin marketplace add`
pub fn install_slug(plugin: &PluginRecord, marketplace: Option<&MarketplaceSource>) -> String {
    marketplace
        .and_then(|m| marketplace_slug(&m.base_url))
        .unwrap_or_else(|| format!("anthropics/{}", plugin.marketplace))
}

/// Full block for one plugin, with repository stats when available
pub fn detailed(
    plugin: &PluginRecord,
    details: Option<&RepositoryDetails>,
    marketplace: Option<&MarketplaceSource>,
) -> String {
    let entry = &plugin.entry;
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", rule));
    out.push_str(&format!(
        "📦 {} [{}]\n",
        entry.name.cyan().bold(),
        plugin.owner.yellow()
    ));
    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("Category: {}\n", entry.category));
    out.push_str(&format!("Description: {}\n", entry.description));

    if !entry.tags.is_empty() {
        out.push_str(&format!("Tags: {}\n", entry.tags.join(", ")));
    }

    if let Some(details) = details {
        out.push_str(&stats_block(details));
    }

    out.push_str(&format!("\n{}\n", "─".repeat(RULE_WIDTH)));
    out.push_str("📥 Installation:\n");
    out.push_str(&format!(
        "  {}\n",
        "# First, add the marketplace (if not already added):".dimmed()
    ));
    out.push_str(&format!(
        "  /plugin marketplace add {}\n\n",
        install_slug(plugin, marketplace)
    ));
    out.push_str(&format!("  {}\n", "# Then install the plugin:".dimmed()));
    out.push_str(&format!("  /plugin install {}\n", plugin.full_id()));

    out.push_str(&format!(
        "\nHomepage: {}\n",
        entry.homepage.as_deref().unwrap_or("N/A")
    ));

    out
}

fn stats_block(details: &RepositoryDetails) -> String {
    let mut parts = vec![format!("⭐ Stars: {}", details.summary.stars)];
    let mut out = String::new();

    if let Some(facts) = &details.facts {
        parts.push(format!(
            "🔌 MCP: {}",
            if facts.has_mcp { "Yes" } else { "No" }
        ));
        parts.push(format!("📜 Commands: {}", facts.commands.len()));
        parts.push(format!("🎯 Skills: {}", facts.skills.len()));
    }

    if let Some(updated) = details.summary.updated_at {
        parts.push(format!("🕐 Last Updated: {}", updated.format("%Y-%m-%d")));
    }

    out.push_str(&format!("\n{}\n", parts.join(" | ")));

    if let Some(facts) = &details.facts {
        if !facts.commands.is_empty() || !facts.skills.is_empty() {
            out.push('\n');
        }
        if !facts.commands.is_empty() {
            out.push_str(&preview_list("Commands", &facts.commands));
        }
        if !facts.skills.is_empty() {
            if !facts.commands.is_empty() {
                out.push('\n');
            }
            out.push_str(&preview_list("Skills", &facts.skills));
        }
    }

    out
}

fn preview_list(title: &str, items: &[String]) -> String {
    let mut out = format!("{}:\n", title);
    for item in items.iter().take(LIST_PREVIEW) {
        out.push_str(&format!("  - {}\n", item));
    }
    if items.len() > LIST_PREVIEW {
        out.push_str(&format!("  ... and {} more\n", items.len() - LIST_PREVIEW));
    }
    out
}

/// Hint printed after long detailed listings
pub fn narrowing_tip() -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "\n{}\n{} Narrow the results with -c, -t, -m or a more specific query\n{}",
        rule,
        "TIP:".bold(),
        rule
    )
}

/// Marketplaces with plugin counts, then categories
pub fn listing(
    marketplaces: &[MarketplaceSource],
    aggregate: &Aggregate,
    categories: &[(String, usize)],
) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{} ({}):\n",
        "Marketplaces".cyan().bold(),
        marketplaces.len()
    ));
    for marketplace in marketplaces {
        out.push_str(&format!(
            "  • {} ({} plugins)\n",
            marketplace.name,
            aggregate.count_for(&marketplace.name)
        ));
        out.push_str(&format!("    {}\n", marketplace.base_url.dimmed()));
    }

    out.push_str(&format!(
        "\n{} ({}):\n",
        "Categories".cyan().bold(),
        categories.len()
    ));
    for (category, count) in categories {
        out.push_str(&format!("  • {} ({} plugins)\n", category, count));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugin_search_core::{
        MarketplaceDocument, RepositoryFacts, RepositoryRef, RepositorySummary,
    };

    fn plugin(json: &str) -> PluginRecord {
        let doc = MarketplaceDocument::parse(&format!(r#"{{"plugins": [{}]}}"#, json)).unwrap();
        PluginRecord::new(doc.plugins[0].clone(), "official", "Acme")
    }

    fn details(commands: usize) -> RepositoryDetails {
        RepositoryDetails {
            reference: RepositoryRef::new("acme", "widgets", "main"),
            summary: RepositorySummary {
                stars: 7,
                updated_at: None,
                default_branch: "main".to_string(),
            },
            facts: Some(RepositoryFacts {
                has_mcp: true,
                commands: (0..commands).map(|i| format!("cmd{}.md", i)).collect(),
                skills: vec![],
            }),
        }
    }

    #[test]
    fn test_compact_contains_fields() {
        colored::control::set_override(false);
        let line = compact(1, &plugin(r#"{"name": "lint", "description": "Lints"}"#));
        assert_eq!(line, "1. lint (uncategorized) [Acme] - Lints");
    }

    #[test]
    fn test_detailed_truncates_lists() {
        colored::control::set_override(false);
        let record = plugin(r#"{"name": "lint"}"#);
        let out = detailed(&record, Some(&details(7)), None);

        assert!(out.contains("⭐ Stars: 7 | 🔌 MCP: Yes | 📜 Commands: 7 | 🎯 Skills: 0"));
        assert!(out.contains("  - cmd4.md"));
        assert!(!out.contains("  - cmd5.md"));
        assert!(out.contains("... and 2 more"));
        assert!(out.contains("/plugin install lint@official"));
        assert!(out.contains("/plugin marketplace add anthropics/official"));
        assert!(out.contains("Homepage: N/A"));
    }

    #[test]
    fn test_install_slug_from_marketplace() {
        let record = plugin(r#"{"name": "lint"}"#);
        let marketplace = MarketplaceSource::new("official", "https://github.com/acme/market");
        assert_eq!(install_slug(&record, Some(&marketplace)), "acme/market");
    }
}
