use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::{render, session};
use std::io;
use std::path::PathBuf;
use tagger_core::config::{self, AppConfig};
use tagger_core::{intake, upload, ImageRecordStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Tag { paths, json } => run_tag(cfg, paths, json).await,
        Commands::Session => run_session(cfg).await,
        Commands::Upload {
            file,
            dry_run,
            branch,
            json,
        } => run_upload(cfg, file, dry_run, branch, json).await,
    }
}

#[derive(Parser)]
#[command(name = "image-tagger")]
#[command(about = "Derive tags for images and push them to a repository", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode images and print their metadata and derived tags
    Tag {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session reading commands from stdin
    Session,
    /// Upload one image to the configured repository
    Upload {
        file: PathBuf,
        /// Log the request instead of sending it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Override the configured branch
        #[arg(long)]
        branch: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

async fn run_tag(cfg: AppConfig, paths: Vec<PathBuf>, json: bool) -> Result<()> {
    let files = session::read_files(&paths, &cfg.intake).await?;
    let mut store = ImageRecordStore::new(cfg.tagging.clone());
    let report = store.add_batch(files).await;

    let mut out = io::stdout().lock();
    if json {
        render::write_records_json(&mut out, store.records())?;
    } else {
        render::write_records(&mut out, store.records())?;
        render::write_report(&mut out, &report)?;
    }
    Ok(())
}

async fn run_session(cfg: AppConfig) -> Result<()> {
    let mut store = ImageRecordStore::new(cfg.tagging.clone());
    let stdin = io::stdin().lock();
    let mut out = io::stdout().lock();
    session::run(&mut store, &cfg, stdin, &mut out).await
}

async fn run_upload(
    mut cfg: AppConfig,
    file: PathBuf,
    dry_run: bool,
    branch: Option<String>,
    json: bool,
) -> Result<()> {
    if let Some(branch) = branch {
        cfg.upload.branch = branch;
    }
    let source = intake::load(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let receipt = upload::upload_source(&cfg.upload, &source, dry_run).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        match &receipt.html_url {
            Some(url) => println!("uploaded {} -> {}", receipt.path, url),
            None => println!("uploaded {}", receipt.path),
        }
    }
    Ok(())
}
