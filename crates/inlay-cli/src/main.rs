mod config;
mod demo;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::CliConfig;
use inlay_rewrite::Rewriter;
use inlay_tree::{Expr, Registry};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "inlay")]
#[command(about = "Inline and flatten composed expression trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a JSON-encoded tree
    Rewrite {
        /// Input document
        file: PathBuf,
        /// Print the flattened tree as JSON
        #[arg(long)]
        json: bool,
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Maximum depth of nested inlinings
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Rewrite and run the built-in demonstration queries
    Demo,
}

/// A tree plus the static fragments it may reference.
#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    fragments: Vec<Fragment>,
    tree: Expr,
}

#[derive(Debug, Deserialize)]
struct Fragment {
    owner: String,
    name: String,
    expr: Expr,
}

impl Document {
    fn registry(&self) -> Registry {
        self.fragments
            .iter()
            .fold(Registry::builder(), |builder, f| {
                builder.field(f.owner.as_str(), f.name.as_str(), f.expr.clone())
            })
            .build()
    }
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "inlay=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rewrite {
            file,
            json,
            config,
            max_depth,
        } => rewrite_file(&file, json, config.as_deref(), max_depth),
        Commands::Demo => demo::run(),
    }
}

fn rewrite_file(
    file: &Path,
    json: bool,
    config: Option<&Path>,
    max_depth: Option<usize>,
) -> anyhow::Result<()> {
    let config = CliConfig::resolve(config, max_depth).context("failed to load configuration")?;
    let content =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let document: Document = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid tree document", file.display()))?;

    let registry = document.registry();
    info!(
        file = %file.display(),
        fragments = registry.len(),
        max_depth = config.rewrite.max_inline_depth,
        "rewriting"
    );
    let flat = Rewriter::with_config(&registry, config.rewrite)
        .rewrite(&document.tree)
        .context("rewrite failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&flat)?);
    } else {
        println!("{}", flat);
    }
    Ok(())
}
