//! ebay-catalog - Command-line access to the eBay Shopping and Finding APIs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ebay_catalog::commands::{LookupCommand, LookupKind, SearchCommand, SearchKind};
use ebay_catalog::config::{Config, OutputFormat};
use ebay_catalog::ebay::{Properties, Transport};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ebay-catalog",
    version,
    about = "Query the eBay Shopping and Finding APIs",
    long_about = "Looks up users, categories and items on eBay. Multi-id lookups are issued \
                  concurrently and printed in the order the ids were given."
)]
struct Cli {
    /// eBay application id
    #[arg(long, global = true, env = "EBAY_APP_ID", hide_env_values = true)]
    app_id: Option<String>,

    /// Wire transport (jsonp, json)
    #[arg(short, long, global = true)]
    mode: Option<Transport>,

    /// Base URL replacing the Shopping and Finding endpoints
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Extra call property, repeatable (e.g. -p IncludeSelector=Details)
    #[arg(short = 'p', long = "prop", global = true, value_parser = Properties::parse_pair)]
    props: Vec<(String, String)>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up user profiles
    #[command(alias = "u")]
    Users {
        /// User id(s)
        #[arg(required = true)]
        ids: Vec<String>,

        /// Report failed users in place instead of failing the lookup
        #[arg(long)]
        settle: bool,
    },

    /// Look up category info
    #[command(alias = "c")]
    Categories {
        /// Category id(s)
        #[arg(required = true)]
        ids: Vec<String>,

        /// Report failed categories in place instead of failing the lookup
        #[arg(long)]
        settle: bool,
    },

    /// Look up items in a single call
    #[command(alias = "i")]
    Items {
        /// Item id(s)
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Popular items for keywords
    Popular {
        /// Search keywords
        query: String,
    },

    /// Search items by keywords
    #[command(alias = "s")]
    Search {
        /// Search keywords
        query: String,
    },

    /// List items in a category
    Browse {
        /// Category id
        category: String,
    },

    /// Product catalogue info for keywords
    Product {
        /// Search keywords
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(app_id) = cli.app_id {
        config.app_id = app_id;
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = Some(base_url);
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_ms = timeout;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    let props: Properties = cli.props.into_iter().collect();

    let output = match cli.command {
        Commands::Users { ids, settle } => {
            LookupCommand::new(config).execute(LookupKind::Users, &ids, &props, settle).await?
        }
        Commands::Categories { ids, settle } => {
            LookupCommand::new(config)
                .execute(LookupKind::Categories, &ids, &props, settle)
                .await?
        }
        Commands::Items { ids } => {
            LookupCommand::new(config).execute(LookupKind::Items, &ids, &props, false).await?
        }
        Commands::Popular { query } => {
            SearchCommand::new(config).execute(SearchKind::Popular, &query, &props).await?
        }
        Commands::Search { query } => {
            SearchCommand::new(config).execute(SearchKind::Keywords, &query, &props).await?
        }
        Commands::Browse { category } => {
            SearchCommand::new(config).execute(SearchKind::Category, &category, &props).await?
        }
        Commands::Product { query } => {
            SearchCommand::new(config).execute(SearchKind::Product, &query, &props).await?
        }
    };

    println!("{}", output);

    Ok(())
}
