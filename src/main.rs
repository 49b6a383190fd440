//! Ripple-Search main entry point
//!
//! This is the command-line interface for the Ripple-Search crawler and search engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ripple_search::config::{load_config_with_hash, Config};
use ripple_search::output::{print_json, print_statistics};
use ripple_search::search::{SearchRequest, DEFAULT_LIMIT};
use ripple_search::{RippleError, SearchService, TraversalOrder};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ripple-Search: a bounded site crawler with ranked keyword search
///
/// Ripple-Search crawls an allow-listed set of domains breadth-first or
/// depth-first, stores every page with its parent and depth, and answers
/// TF-IDF ranked queries over the stored pages.
#[derive(Parser, Debug)]
#[command(name = "ripple-search")]
#[command(version = "1.0.0")]
#[command(about = "A bounded site crawler with ranked keyword search", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate config and show what would be crawled without crawling
    Check,

    /// Crawl from the configured seeds and index the results
    Crawl {
        /// Override the configured traversal order
        #[arg(long, value_enum)]
        algorithm: Option<TraversalOrder>,
    },

    /// Search the stored pages
    Search {
        /// Query text; an empty query lists every page
        query: String,

        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Restrict results to one domain ("all" for no restriction)
        #[arg(long)]
        domain: Option<String>,

        /// Bypass the result cache
        #[arg(long)]
        no_cache: bool,
    },

    /// List the domains present in the database
    Domains,

    /// Show recent searches, newest first
    History {
        /// Number of entries (defaults to the configured history limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show statistics from the database
    Stats,

    /// Remove every cached search result
    ClearCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Command::Crawl {
        algorithm: Some(order),
    } = &cli.command
    {
        config.crawler.algorithm = *order;
    }

    if let Command::Check = cli.command {
        handle_check(&config);
        return Ok(());
    }

    let service = SearchService::open(config)?;

    match cli.command {
        Command::Check => {}
        Command::Crawl { .. } => handle_crawl(&service).await?,
        Command::Search {
            query,
            limit,
            domain,
            no_cache,
        } => {
            let mut request = SearchRequest::new(query).limit(limit).use_cache(!no_cache);
            request.domain_filter = domain;
            print_json(&service.search(&request)?)?;
        }
        Command::Domains => print_json(&service.list_domains()?)?,
        Command::History { limit } => print_json(&service.search_history(limit)?)?,
        Command::Stats => {
            println!("Database: {}\n", service.config().storage.database_path);
            print_statistics(&service.stats()?);
        }
        Command::ClearCache => {
            let removed = service.clear_cache()?;
            println!("✓ Removed {} cached searches", removed);
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_search=info,warn"),
            1 => EnvFilter::new("ripple_search=debug,info"),
            2 => EnvFilter::new("ripple_search=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles `check`: shows the validated configuration and crawl plan
fn handle_check(config: &Config) {
    println!("=== Ripple-Search Check ===\n");

    println!("Crawler Configuration:");
    println!("  Algorithm: {}", config.crawler.algorithm);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Crawl delay: {}s", config.crawler.crawl_delay);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nSearch:");
    println!(
        "  Cache: {} (ttl {}s)",
        if config.search.cache_enabled { "enabled" } else { "disabled" },
        config.search.cache_ttl
    );
    println!("  Max features: {}", config.search.max_features);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!(
        "\nAllowed Domains ({}):",
        config.crawler.allowed_domains.len()
    );
    for domain in &config.crawler.allowed_domains {
        println!("  - {}", domain);
    }

    println!("\nSeed URLs ({}):", config.crawler.seed_urls.len());
    for seed in &config.crawler.seed_urls {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles `crawl`: runs to completion, stopping early on Ctrl-C
async fn handle_crawl(service: &SearchService) -> anyhow::Result<()> {
    let handle = service.start_crawl()?;
    let mut task = handle.task;

    let outcome = tokio::select! {
        joined = &mut task => joined,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupt received, stopping after the current page");
            service.stop_crawl();
            task.await
        }
    }
    .context("Crawl task panicked")?;

    match outcome {
        Ok(outcome) => {
            print_json(&outcome)?;
            Ok(())
        }
        Err(RippleError::Persist { pending, source }) => {
            tracing::error!("Crawled {} pages but could not store them", pending.len());
            Err(anyhow::Error::new(source).context("Failed to store crawl results"))
        }
        Err(e) => Err(e.into()),
    }
}
