use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "plugin-search")]
#[command(about = "Search Claude Code plugins across marketplaces")]
#[command(version)]
#[command(after_help = "Examples:
  plugin-search -q notion                    # Search for plugins matching \"notion\"
  plugin-search --all                        # List all plugins (compact)
  plugin-search list                         # Show marketplaces and categories
  plugin-search -d notion linear github      # Detailed info for specific plugins
  plugin-search -q \"issue tracking\" -d       # Search with detailed results
  plugin-search --all -m anthropics-skills   # List plugins from one marketplace
  plugin-search -c productivity              # List all productivity plugins")]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.plugin-search)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Cache directory (default: <base-dir>/cache)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Cache lifetime in seconds (default: from config, 3600)
    #[arg(long, global = true, value_name = "SECONDS")]
    pub ttl: Option<u64>,

    #[command(flatten)]
    pub search: SearchArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Search flags (the default command)
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Search query; multiple terms match ANY (e.g., "notion linear")
    #[arg(short, long)]
    pub query: Option<String>,

    /// Filter by category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Filter by tags (space-separated, matches ANY)
    #[arg(short, long, num_args = 1.., value_name = "TAG")]
    pub tags: Vec<String>,

    /// Filter by marketplace (e.g., claude-plugins-official)
    #[arg(short, long)]
    pub marketplace: Option<String>,

    /// List all plugins (ignore the search query)
    #[arg(long)]
    pub all: bool,

    /// Show detailed information (optionally for specific plugins: -d notion linear)
    #[arg(short, long, num_args = 0.., value_name = "PLUGIN")]
    pub detailed: Option<Vec<String>>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Refetch every marketplace, ignoring the cache age
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List marketplaces and categories
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// Refetch every marketplace, ignoring the cache age
        #[arg(long)]
        refresh: bool,
    },

    /// List all tags
    Tags {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configured marketplaces
    Marketplace {
        #[command(subcommand)]
        action: MarketplaceAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum MarketplaceAction {
    /// Add a marketplace (GitHub repository or marketplace.json URL)
    Add {
        /// Marketplace name
        name: String,

        /// Base URL (e.g., https://github.com/owner/repo)
        url: String,
    },

    /// Remove a marketplace and its cached data
    Remove {
        /// Marketplace name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show a config value
    Get {
        /// Key (e.g., cache.ttl_secs)
        key: String,
    },

    /// Set a config value
    Set {
        /// Key (cache.ttl_secs, cache.dir)
        key: String,

        /// Value
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Create config file with default marketplaces
    Init,
}
