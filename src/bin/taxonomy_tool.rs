//! taxonomy-tool - maintain the semantic-type taxonomy
//!
//! Usage:
//!   taxonomy-tool fix              align provider/method with keys, rewrite in place
//!   taxonomy-tool merge            full canonicalization, write the `_v2` snapshot
//!
//! Logging goes to stderr. `RUST_LOG` directives replace the default level
//! (`warn`), e.g. `RUST_LOG=debug` or `RUST_LOG=semtype_registry=info`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use semtype_registry::taxonomy::{
    self, CanonicalizationPlan, CanonicalizationReport, FileStore, TaxonomyStore,
};
use semtype_registry::RegistryConfig;

#[derive(Parser)]
#[command(name = "taxonomy-tool")]
#[command(about = "Validate and canonicalize the semantic-type taxonomy")]
struct Cli {
    /// Project root that holds labels/ and config/
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Compute and print the report without writing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Make every definition's provider/method match its key (in place)
    Fix,

    /// Validate, merge duplicates, drop ambiguous classes, annotate look-alikes
    Merge {
        /// Canonicalization plan (defaults to the configured or built-in plan)
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Output file (defaults to the `_v2` sibling of the taxonomy)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = RegistryConfig::for_root(&cli.root)
        .with_context(|| format!("Failed to read registry config under {:?}", cli.root))?;

    let (store, result, report) = match cli.command {
        Command::Fix => {
            let store = FileStore::in_place(&config.taxonomy_path);
            let loaded = store.load().context("Failed to load taxonomy")?;
            let (fixed, report) = taxonomy::fix_keys(loaded).context("Key validation failed")?;
            (store, fixed, report)
        }
        Command::Merge { plan, output } => {
            let plan = match plan {
                Some(path) => CanonicalizationPlan::load(&path)
                    .with_context(|| format!("Failed to load plan {:?}", path))?,
                None => config.plan().context("Failed to load canonicalization plan")?,
            };
            let store = FileStore::new(
                &config.taxonomy_path,
                output.unwrap_or_else(|| config.merged_path.clone()),
            );
            let loaded = store.load().context("Failed to load taxonomy")?;
            let (merged, report) =
                taxonomy::canonicalize(loaded, &plan).context("Canonicalization failed")?;
            (store, merged, report)
        }
    };

    if !cli.dry_run {
        store
            .save(&result)
            .with_context(|| format!("Failed to write {:?}", store.destination()))?;
    }

    print_report(&report, cli.json)?;
    if !cli.json {
        if cli.dry_run {
            println!("\n(dry run, nothing written)");
        } else {
            println!("\nOutput: {}", store.destination().display());
        }
    }
    Ok(())
}

fn print_report(report: &CanonicalizationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

/// `RUST_LOG` directives when set and valid, otherwise `warn`
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}
