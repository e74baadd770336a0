//! SmartSales365 - admin list, report and prediction tooling
//!
//! Browses any paginated backend list, exports the built-in reports to
//! xlsx/pdf/print-ready HTML and summarises sales predictions.

mod commands;
mod config;
mod progress;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::CommandContext;
use smartsales_core::SmartSalesConfig;

#[derive(Parser)]
#[command(name = "smartsales")]
#[command(author = "SmartSales365 Team")]
#[command(version = smartsales_core::VERSION)]
#[command(about = "SmartSales365 admin tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SMARTSALES_CONFIG")]
    config: Option<PathBuf>,

    /// Named profile from ~/.smartsales/config.toml
    #[arg(long, global = true, env = "SMARTSALES_PROFILE")]
    profile: Option<String>,

    /// Backend API base URL
    #[arg(long, global = true, env = "SMARTSALES_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the backend
    #[arg(long, global = true, env = "SMARTSALES_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SMARTSALES_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print results
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page of a paginated backend list
    List {
        /// Endpoint path, e.g. /usuarios/users/customers/
        endpoint: String,

        /// Free-text search term
        #[arg(short, long)]
        search: Option<String>,

        /// Ordering token ("field" or "-field")
        #[arg(long)]
        ordering: Option<String>,

        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Rows per page
        #[arg(long)]
        page_size: Option<u32>,

        /// User filter (key=value), repeatable
        #[arg(short, long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Fixed filter of the screen (key=value), repeatable
        #[arg(long = "fixed", value_name = "KEY=VALUE")]
        fixed: Vec<String>,

        /// Keep following `next` links and print every page
        #[arg(long)]
        all: bool,
    },

    /// Export a built-in report
    Export {
        /// Report name (products, users)
        report: String,

        /// Output format
        #[arg(short, long, default_value = "xlsx")]
        format: String,

        /// Maximum rows fetched (100, 500, 1000, 5000)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Comma-separated column keys; defaults to the report's selection
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Free-text search term
        #[arg(short, long)]
        search: Option<String>,

        /// Report filter (key=value), repeatable
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Output directory
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,
    },

    /// Show built-in reports and their columns
    Reports,

    /// Summarise sales predictions for a date range
    Predictions {
        /// First day (YYYY-MM-DD); defaults to the start of the data
        #[arg(long)]
        from: Option<String>,

        /// Last day (YYYY-MM-DD); defaults to the end of the data
        #[arg(long)]
        to: Option<String>,

        /// Number of products in the ranking
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Ask the backend instead of the bundled data
        #[arg(long)]
        remote: bool,
    },

    /// Manage CLI configuration
    Configure {
        #[command(subcommand)]
        action: ConfigureAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigureAction {
    /// Set a configuration value
    Set { key: String, value: String },

    /// Get a configuration value
    Get { key: String },

    /// List configuration and profiles
    List,

    /// Create a new profile
    AddProfile { name: String },

    /// Remove a profile
    RemoveProfile { name: String },
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", colored::Colorize::red("error:"), err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    init_logging(&config, cli.verbose);

    let ctx = CommandContext {
        config,
        profile: cli.profile.clone(),
        output_format: cli.output,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::List {
            endpoint,
            search,
            ordering,
            page,
            page_size,
            filters,
            fixed,
            all,
        } => {
            commands::list::execute(
                &ctx,
                commands::list::ListArgs {
                    endpoint,
                    search,
                    ordering,
                    page,
                    page_size,
                    filters,
                    fixed,
                    all,
                },
            )
            .await
        }
        Commands::Export {
            report,
            format,
            limit,
            columns,
            search,
            filters,
            output_dir,
        } => {
            commands::export::execute(
                &ctx,
                commands::export::ExportArgs {
                    report,
                    format,
                    limit,
                    columns,
                    search,
                    filters,
                    output_dir,
                },
            )
            .await
        }
        Commands::Reports => commands::reports::execute(&ctx),
        Commands::Predictions {
            from,
            to,
            top,
            remote,
        } => commands::predictions::execute(&ctx, from, to, top, remote).await,
        Commands::Configure { action } => commands::configure::execute(&ctx, action),
    }
}

/// Defaults, then the config file, then the profile, then environment and flags
fn load_config(cli: &Cli) -> Result<SmartSalesConfig> {
    let mut config = match &cli.config {
        Some(path) => SmartSalesConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => SmartSalesConfig::default(),
    };

    config::Config::load(cli.profile.as_deref())?.apply_to(&mut config);
    config.apply_env();

    if let Some(api_url) = &cli.api_url {
        config.api.base_url = api_url.clone();
    }
    if let Some(token) = &cli.token {
        config.api.token = Some(token.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn init_logging(config: &SmartSalesConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
