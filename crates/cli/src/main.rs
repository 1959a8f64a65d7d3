use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nsdoc_index::{ActiveSelection, IndexStats, Menu, NamespaceIndex, ScanStats};
use serde::Serialize;
use std::path::PathBuf;

use config::{ProjectConfig, DEFAULT_CONFIG_FILE};
use links::TemplateResolver;

mod cache;
mod config;
mod links;

#[derive(Parser)]
#[command(name = "nsdoc")]
#[command(about = "Namespace index and navigation menu for source trees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project config file
    #[arg(long, global = true, env = "NSDOC_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every configured namespace and write the cache
    Scan,

    /// Print the navigation menu
    Menu(MenuArgs),

    /// Print all entries keyed by source file
    Entries,

    /// Print all documentation files
    Docs,

    /// Check whether a fully-qualified entry exists
    Has(HasArgs),
}

#[derive(Args)]
struct MenuArgs {
    /// Active entry (bare name)
    #[arg(long, default_value = "")]
    class: String,

    /// Active namespace
    #[arg(long, default_value = "")]
    namespace: String,
}

#[derive(Args)]
struct HasArgs {
    /// Fully-qualified entry name, e.g. App\Models\User
    name: String,
}

#[derive(Serialize)]
struct ScanOutput {
    cache: PathBuf,
    scan: ScanStats,
    index: IndexStats,
}

#[derive(Serialize)]
struct HasOutput<'a> {
    name: &'a str,
    found: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = ProjectConfig::load(&cli.config)?;

    match &cli.command {
        Commands::Scan => {
            let (index, scan) = scan_project(&config)?;
            let cache = config.cache_path();
            index
                .try_save(&cache)
                .with_context(|| format!("Cannot write cache {}", cache.display()))?;
            cache::write_sources(&cache, &config.sources())?;
            print_json(
                &ScanOutput {
                    cache,
                    scan,
                    index: index.stats(),
                },
                cli.pretty,
            )
        }
        Commands::Menu(args) => {
            let index = load_or_scan(&config)?;
            let active = ActiveSelection::new(args.class.clone(), args.namespace.clone());
            let resolver =
                TemplateResolver::new(config.url_template.clone(), index.config().separator);
            let menu: Menu = index.build_menu(&active, &resolver);
            print_json(&menu, cli.pretty)
        }
        Commands::Entries => {
            let index = load_or_scan(&config)?;
            print_json(&index.collect_all_entries(None), cli.pretty)
        }
        Commands::Docs => {
            let index = load_or_scan(&config)?;
            print_json(&index.collect_all_doc_files(None), cli.pretty)
        }
        Commands::Has(args) => {
            let index = load_or_scan(&config)?;
            print_json(
                &HasOutput {
                    name: &args.name,
                    found: index.has_entry(&args.name),
                },
                cli.pretty,
            )
        }
    }
}

/// Builds a fresh index from the configured sources.
fn scan_project(config: &ProjectConfig) -> Result<(NamespaceIndex, ScanStats)> {
    let mut index = NamespaceIndex::new(config.scan_config()).context("Invalid scan config")?;
    let mut stats = ScanStats::default();

    for source in &config.namespaces {
        let directory = config.resolve(&source.directory);
        log::debug!("Scanning {} as {}", directory.display(), source.name);
        stats.merge(&index.scan_directory(&source.name, &directory, source.local));
    }

    for file in &config.root_files {
        let path = config.resolve(&file.path);
        if index.register_root_entry(&path.to_string_lossy(), file.local) {
            stats.entries += 1;
        }
    }

    for namespace in &config.exclude {
        if index.find_node(namespace).is_some() {
            index.delete_namespace(namespace);
        }
    }

    index.sort();
    log::info!(
        "Indexed {} entries in {} directories",
        stats.entries,
        stats.directories
    );
    Ok((index, stats))
}

/// Reuses the cache when it was built from the configured sources, otherwise
/// rescans and refreshes it.
fn load_or_scan(config: &ProjectConfig) -> Result<NamespaceIndex> {
    let cache = config.cache_path();
    let sources = config.sources();
    let mut index = NamespaceIndex::new(config.scan_config()).context("Invalid scan config")?;
    if cache::sources_match(&cache, &sources) && index.load(&cache) {
        index.sort();
        return Ok(index);
    }

    log::info!("Cache {} unavailable or stale, scanning", cache.display());
    let (index, _) = scan_project(config)?;
    if !index.save(&cache) {
        log::warn!("Continuing without cache");
    } else if let Err(err) = cache::write_sources(&cache, &sources) {
        log::warn!("{err:#}");
    }
    Ok(index)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}
