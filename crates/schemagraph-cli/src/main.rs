//! Schemagraph CLI
//!
//! Loads schema documents and manifests through the configured storage
//! namespaces and reports on them:
//! - `paths`: declared path and kind of every object
//! - `status`: refresh partition and manifest modification times
//! - `deps`: symbols an entity transitively depends on

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use schemagraph_model::{CopyOptions, Corpus, NodeId, ObjectType, ResolveOptions, SymbolSet};
use schemagraph_persistence::{load_from_storage, load_imports};
use std::path::PathBuf;

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "schemagraph")]
#[command(author, version, about = "Schemagraph: inspect schema documents and manifests")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON config with namespace mounts
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the declared path and kind of every object in a document or manifest
    Paths {
        /// Corpus path, e.g. `local:/sales/sales.manifest.cdm.json`
        path: String,
    },

    /// Check the files behind a manifest and report modification times
    Status {
        /// Corpus path of the manifest
        path: String,
        /// Write the refreshed manifest JSON instead of the summary
        #[arg(long)]
        json: bool,
    },

    /// Print the symbols an entity transitively depends on
    Deps {
        /// Corpus path of the document defining the entity
        path: String,
        /// Entity name
        entity: String,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = CliConfig::load(cli.config.as_deref())?;
    let mut corpus = config.corpus();

    match cli.command {
        Commands::Paths { path } => cmd_paths(&mut corpus, &path).await,
        Commands::Status { path, json } => cmd_status(&mut corpus, &path, json).await,
        Commands::Deps { path, entity } => cmd_deps(&mut corpus, &path, &entity).await,
    }
}

async fn cmd_paths(corpus: &mut Corpus, path: &str) -> Result<()> {
    let root = load_from_storage(corpus, path).await?;

    let mut rows = Vec::new();
    corpus.visit_all(
        root,
        |_, node, declared| {
            rows.push((declared.to_string(), node.object_type()));
            false
        },
        |_, _, _| false,
    )?;

    println!("{} {}", "Declared paths in".green().bold(), path);
    for (declared, object_type) in rows {
        let declared = if declared.is_empty() { "(root)".to_string() } else { declared };
        println!("  {:<60} {}", declared, object_type.to_string().dimmed());
    }
    Ok(())
}

async fn cmd_status(corpus: &mut Corpus, path: &str, json: bool) -> Result<()> {
    let manifest = load_from_storage(corpus, path).await?;
    corpus
        .manifest(manifest)
        .with_context(|| format!("{path} is not a manifest"))?;
    corpus.file_status_check(manifest).await?;

    if json {
        let res_opt = ResolveOptions::with_wrt_doc(manifest);
        let data = schemagraph_persistence::to_data(corpus, manifest, &res_opt, &CopyOptions::default())?;
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} {}", "Checked".green().bold(), path);
    for id in partitions(corpus, manifest)? {
        let partition = corpus.partition(id)?;
        let modified = partition
            .last_file_modified_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "missing".yellow().to_string());
        println!("  {:<50} {}", corpus.declared_path_of(id)?, modified);
    }

    let summary = corpus.manifest(manifest)?;
    let child_time = summary
        .last_child_file_modified_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "none".to_string());
    println!("{} {}", "Most recent child file:".bold(), child_time);
    Ok(())
}

fn partitions(corpus: &Corpus, root: NodeId) -> Result<Vec<NodeId>> {
    let mut found = Vec::new();
    for id in corpus.subtree(root)? {
        if corpus.node(id)?.object_type() == ObjectType::DataPartitionDef {
            found.push(id);
        }
    }
    Ok(found)
}

async fn cmd_deps(corpus: &mut Corpus, path: &str, entity: &str) -> Result<()> {
    let doc = load_from_storage(corpus, path).await?;
    load_imports(corpus, doc).await?;

    let definition = corpus
        .document(doc)?
        .definitions
        .iter()
        .copied()
        .find(|&id| corpus.name_of(id) == Some(entity))
        .ok_or_else(|| anyhow!("no definition named '{entity}' in {path}"))?;

    let mut symbols = SymbolSet::new();
    corpus.collect_symbol_dependencies(definition, &ResolveOptions::with_wrt_doc(doc), &mut symbols)?;

    println!("{} {} ({})", "Dependencies of".green().bold(), entity.bold(), symbols.size());
    for symbol in symbols.sorted() {
        println!("  {symbol}");
    }
    Ok(())
}
