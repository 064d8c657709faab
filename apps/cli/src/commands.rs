//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::info;

use docsmith_shared::{SiteConfig, init_site_config, load_site_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docsmith — sanitize, index, and export documentation corpora.
#[derive(Parser)]
#[command(
    name = "docsmith",
    version,
    about = "Build navigation/search indexes and an LLMS pack from markdown corpora.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build index.json and search.json for every corpus.
    Index {
        /// Site root directory (defaults to the working directory).
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Build the concatenated LLMS pack from existing indexes.
    Export {
        /// Site root directory (defaults to the working directory).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Output path override for the pack.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run index then export in one pass.
    Build {
        /// Site root directory (defaults to the working directory).
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,

        /// Site root directory (defaults to the working directory).
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default docsmith.toml at the site root.
    Init,
    /// Show the resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docsmith=info",
        1 => "docsmith=debug",
        _ => "docsmith=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Index { root } => cmd_index(root),
        Command::Export { root, output } => cmd_export(root, output.as_deref()),
        Command::Build { root } => cmd_build(root),
        Command::Config { action, root } => match action {
            ConfigAction::Init => cmd_config_init(root),
            ConfigAction::Show => cmd_config_show(root),
        },
    }
}

/// Resolve the site root, defaulting to the working directory.
fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(p) => Ok(p),
        None => Ok(std::env::current_dir()?),
    }
}

fn load_site(root: &std::path::Path) -> Result<SiteConfig> {
    Ok(load_site_config(root)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_index(root: Option<PathBuf>) -> Result<()> {
    let site_root = resolve_root(root)?;
    let config = load_site(&site_root)?;

    info!(root = %site_root.display(), corpora = config.corpora.len(), "indexing site");
    let reports = docsmith_index::build_site(&site_root, &config)?;

    println!();
    for report in &reports {
        println!("  {}:", report.kind);
        println!("    Documents: {}", report.count);
        println!("    index.json:  {}", report.index);
        println!("    search.json: {}", report.search);
    }
    println!();

    Ok(())
}

fn cmd_export(root: Option<PathBuf>, output: Option<&std::path::Path>) -> Result<()> {
    let site_root = resolve_root(root)?;
    let config = load_site(&site_root)?;

    info!(root = %site_root.display(), "exporting LLMS pack");
    let report = docsmith_export::build_pack(&site_root, &config, output)?;

    println!();
    println!("  LLMS pack: {}", report.outcome);
    println!("  Path:      {}", report.path.display());
    println!("  Documents: {}", report.doc_count);
    if report.missing_sources > 0 {
        println!("  Missing sources: {}", report.missing_sources);
    }
    println!();

    Ok(())
}

fn cmd_build(root: Option<PathBuf>) -> Result<()> {
    let site_root = resolve_root(root)?;
    let config = load_site(&site_root)?;

    info!(root = %site_root.display(), "building site artifacts");
    let reports = docsmith_index::build_site(&site_root, &config)?;
    let export = docsmith_export::build_pack(&site_root, &config, None)?;

    println!();
    for report in &reports {
        println!("  {}:", report.kind);
        println!("    Documents: {}", report.count);
        println!("    index.json:  {}", report.index);
        println!("    search.json: {}", report.search);
    }
    println!("  LLMS pack: {} ({})", export.outcome, export.path.display());
    if export.missing_sources > 0 {
        println!("  Missing sources: {}", export.missing_sources);
    }
    println!();

    Ok(())
}

fn cmd_config_init(root: Option<PathBuf>) -> Result<()> {
    let site_root = resolve_root(root)?;
    let path = init_site_config(&site_root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: Option<PathBuf>) -> Result<()> {
    let site_root = resolve_root(root)?;
    let config = load_site(&site_root)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
