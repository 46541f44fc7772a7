use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use serde_json::Value;

use plugin_search_core::{
    filter, find_by_names, inspect_target, list_categories, list_tags, Aggregate, Aggregator,
    Config, FilterCriteria, MarketplaceSource, PluginRecord, PluginSearchError, RegistryCache,
    RepositoryInspector, ReqwestClient, Result,
};

mod args;
mod render;
use args::{Cli, Commands, ConfigAction, MarketplaceAction, SearchArgs, Shell};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let base_dir = resolve_base_dir(cli.base_dir.clone());
    let overrides = cli_overrides(&cli);

    let result = match cli.command {
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        Some(Commands::Marketplace { action }) => {
            handle_marketplace(action, &base_dir, cli.cache_dir.as_deref())
        }
        Some(Commands::List { json, refresh }) => Session::open(&overrides, &base_dir)
            .and_then(|session| handle_list(&session, json, refresh)),
        Some(Commands::Tags { json }) => Session::open(&overrides, &base_dir)
            .and_then(|session| handle_tags(&session, json)),
        None => Session::open(&overrides, &base_dir)
            .and_then(|session| handle_search(&session, &cli.search)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Installs the stderr log subscriber; RUST_LOG overrides the flags
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plugin_search_core={level},{level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "plugin-search", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("PLUGIN_SEARCH_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".plugin-search"))
        .unwrap_or_else(|| PathBuf::from(".plugin-search"))
}

/// Command-line settings that override the config file
struct Overrides {
    cache_dir: Option<PathBuf>,
    ttl: Option<u64>,
    refresh: bool,
}

fn cli_overrides(cli: &Cli) -> Overrides {
    Overrides {
        cache_dir: cli.cache_dir.clone(),
        ttl: cli.ttl,
        refresh: cli.search.refresh,
    }
}

/// Loaded configuration plus the collaborators built from it
struct Session {
    config: Config,
    cache: RegistryCache,
    ttl: Duration,
    refresh: bool,
    http: ReqwestClient,
}

impl Session {
    fn open(overrides: &Overrides, base_dir: &Path) -> Result<Self> {
        let config = Config::load(base_dir)?;
        let cache_dir = overrides
            .cache_dir
            .clone()
            .unwrap_or_else(|| config.cache_dir(base_dir));
        let ttl = overrides
            .ttl
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.cache_ttl());

        Ok(Self {
            cache: RegistryCache::new(cache_dir),
            ttl,
            refresh: overrides.refresh,
            http: ReqwestClient::new()?,
            config,
        })
    }

    fn load(&self, refresh: bool) -> Aggregate {
        Aggregator::new(&self.http, &self.cache, self.ttl)
            .force_refresh(self.refresh || refresh)
            .load_all(&self.config.marketplaces)
    }

    fn marketplace(&self, name: &str) -> Option<&MarketplaceSource> {
        self.config.marketplace(name)
    }
}

fn handle_search(session: &Session, args: &SearchArgs) -> Result<()> {
    let aggregate = session.load(false);

    // -d with names: look those plugins up directly
    if let Some(names) = args.detailed.as_ref().filter(|names| !names.is_empty()) {
        let results = find_by_names(&aggregate.plugins, names);

        if args.json {
            return print_json(session, &results, true);
        }

        println!("\nFound {} plugin(s)", results.len());
        if results.is_empty() {
            println!("\nNo plugins found with the specified names.");
            println!("Searched for: {}", names.join(", "));
            return Ok(());
        }

        print_detailed(session, &results);
        return Ok(());
    }

    let criteria = FilterCriteria {
        query: if args.all { None } else { args.query.clone() },
        category: args.category.clone(),
        tags: args.tags.clone(),
        marketplace: args.marketplace.clone(),
    };
    let results = filter(&aggregate.plugins, &criteria);
    let detailed = args.detailed.is_some();

    if args.json {
        return print_json(session, &results, detailed);
    }

    println!("\nFound {} plugin(s)", results.len());
    if results.is_empty() {
        println!("\nNo plugins found matching your criteria.");
        println!("Try broadening your search or checking available categories.");
        return Ok(());
    }

    if detailed {
        print_detailed(session, &results);
    } else {
        println!();
        for (i, plugin) in results.iter().enumerate() {
            println!("{}", render::compact(i + 1, plugin));
        }
    }

    Ok(())
}

fn print_detailed(session: &Session, results: &[&PluginRecord]) {
    let inspector = RepositoryInspector::new(&session.http);

    for plugin in results {
        let marketplace = session.marketplace(&plugin.marketplace);
        let details =
            inspect_target(plugin, marketplace).and_then(|target| inspector.inspect(&target));
        println!("{}", render::detailed(plugin, details.as_ref(), marketplace));
    }

    if results.len() > render::TIP_THRESHOLD {
        println!("{}", render::narrowing_tip());
    }
}

fn print_json(session: &Session, results: &[&PluginRecord], detailed: bool) -> Result<()> {
    let inspector = RepositoryInspector::new(&session.http);
    let mut items = Vec::with_capacity(results.len());

    for plugin in results {
        let mut value = serde_json::to_value(plugin)?;
        if detailed {
            let marketplace = session.marketplace(&plugin.marketplace);
            let details =
                inspect_target(plugin, marketplace).and_then(|target| inspector.inspect(&target));
            if let (Value::Object(map), Some(details)) = (&mut value, details) {
                map.insert("repository".to_string(), serde_json::to_value(details)?);
            }
        }
        items.push(value);
    }

    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

fn handle_list(session: &Session, json: bool, refresh: bool) -> Result<()> {
    let aggregate = session.load(refresh);
    let categories = list_categories(&aggregate.plugins);

    if json {
        let marketplaces: Vec<Value> = session
            .config
            .marketplaces
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "base_url": m.base_url,
                    "plugins": aggregate.count_for(&m.name),
                })
            })
            .collect();
        let categories: Vec<Value> = categories
            .iter()
            .map(|(name, count)| serde_json::json!({ "name": name, "plugins": count }))
            .collect();
        let out = serde_json::json!({
            "marketplaces": marketplaces,
            "categories": categories,
            "total_marketplaces": aggregate.total,
            "loaded_marketplaces": aggregate.loaded,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print!(
        "{}",
        render::listing(&session.config.marketplaces, &aggregate, &categories)
    );
    if aggregate.loaded < aggregate.total {
        println!(
            "\n{} {} of {} marketplaces loaded",
            "[WARN]".yellow().bold(),
            aggregate.loaded,
            aggregate.total
        );
    }

    Ok(())
}

fn handle_tags(session: &Session, json: bool) -> Result<()> {
    let aggregate = session.load(false);
    let tags = list_tags(&aggregate.plugins);

    if json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }

    println!("\n{} ({}):", "Tags".cyan().bold(), tags.len());
    for tag in tags {
        println!("  • {}", tag);
    }

    Ok(())
}

fn handle_marketplace(
    action: MarketplaceAction,
    base_dir: &Path,
    cache_dir: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load_unchecked(base_dir)?;

    match action {
        MarketplaceAction::Add { name, url } => {
            config.add_marketplace(MarketplaceSource::new(&name, &url))?;
            config.save(base_dir)?;
            println!("{} {} ({})", "Added:".green(), name, url);
        }
        MarketplaceAction::Remove { name } => {
            let removed = config.remove_marketplace(&name)?;
            config.save(base_dir)?;

            let cache_dir = cache_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(|| config.cache_dir(base_dir));
            RegistryCache::new(cache_dir).remove(&removed.name)?;
            println!("{} {}", "Removed:".green(), removed.name);
        }
    }

    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(PluginSearchError::ConfigInvalid {
                        message: format!("unknown config key: {}", key),
                    });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}
