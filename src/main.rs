use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use talos_tags::config::Config;
use talos_tags::reference::{ReferenceParser, TrimOptions};
use talos_tags::tags::cache::CacheFile;
use talos_tags::tags::registries::OciRegistry;
use talos_tags::tags::resolver::resolve_missing_within;
use talos_tags::tags::types::TagSet;

#[derive(Parser)]
#[command(name = "talos-tags")]
#[command(
    version,
    about = "Track cluster-OS release tags and canonicalize extension image references"
)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tag cache file (overrides the config file)
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Repository whose tags mark releases (overrides the config file)
    #[arg(long, global = true)]
    repository: Option<String>,

    /// Log filter, e.g. "debug" or "talos_tags=trace" (defaults to RUST_LOG, then "warn")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch new releases, merge them into the cache and save it
    Update,
    /// Print releases missing from the cache as JSON without saving
    Missing,
    /// Print image references in canonical form
    Canonicalize {
        #[command(flatten)]
        trim: TrimArgs,

        /// References to canonicalize; read one per line from stdin when omitted
        references: Vec<String>,
    },
}

#[derive(Args)]
struct TrimArgs {
    /// Print only org/repo
    #[arg(long)]
    minimal: bool,

    /// Drop the registry host
    #[arg(long)]
    trim_registry: bool,

    /// Drop the @sha256 digest
    #[arg(long)]
    trim_sha256: bool,

    /// Drop the tag
    #[arg(long)]
    trim_tag: bool,
}

impl From<TrimArgs> for TrimOptions {
    fn from(args: TrimArgs) -> Self {
        Self {
            minimal: args.minimal,
            trim_registry: args.trim_registry,
            trim_sha256: args.trim_sha256,
            trim_tag: args.trim_tag,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(
        cli.log_level.as_deref(),
        cli.log_file.as_deref(),
        cli.log_json,
    )?;

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(cache_file) = cli.cache_file {
        config.cache_file = Some(cache_file);
    }
    if let Some(repository) = cli.repository {
        config.repository = repository;
    }

    match cli.command {
        Command::Update => runtime()?.block_on(update(&config)),
        Command::Missing => runtime()?.block_on(missing(&config)),
        Command::Canonicalize { trim, references } => {
            canonicalize(&config, &TrimOptions::from(trim), references)
        }
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn init_logging(
    level: Option<&str>,
    log_file: Option<&Path>,
    json: bool,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let (writer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("log file {:?} has no file name", path))?;
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_file.is_none());
    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(guard)
}

/// Loads the cache and resolves the releases it is missing
async fn fetch_missing(config: &Config) -> anyhow::Result<(CacheFile, TagSet, TagSet)> {
    let cache = CacheFile::new(config.cache_file());
    let known = cache
        .load()
        .with_context(|| format!("failed to load cache {:?}", cache.path()))?;

    let registry = OciRegistry::new(&config.registry)?;
    let deadline = Duration::from_millis(config.registry.deadline_ms);
    let missing = resolve_missing_within(&registry, &config.repository, &known, deadline)
        .await
        .with_context(|| format!("failed to fetch tags from {}", config.repository))?;

    Ok((cache, known, missing))
}

async fn update(config: &Config) -> anyhow::Result<()> {
    let (cache, mut known, missing) = fetch_missing(config).await?;

    if missing.is_empty() {
        info!("cache is up to date with {}", config.repository);
        return Ok(());
    }

    let added = cache
        .merge_and_save(&mut known, missing)
        .with_context(|| format!("failed to save cache {:?}", cache.path()))?;
    info!("added {} versions to {:?}", added.len(), cache.path());

    for tag in added {
        println!("{}", tag);
    }

    Ok(())
}

async fn missing(config: &Config) -> anyhow::Result<()> {
    let (_, _, missing) = fetch_missing(config).await?;
    println!("{}", serde_json::to_string_pretty(&missing)?);
    Ok(())
}

fn canonicalize(
    config: &Config,
    options: &TrimOptions,
    references: Vec<String>,
) -> anyhow::Result<()> {
    let parser = ReferenceParser::with_pattern(&config.reference_pattern)?;

    let lines = if references.is_empty() {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read references from stdin")?;
        parser.canonicalize_lines(&input, options)?
    } else {
        references
            .iter()
            .map(|reference| parser.canonicalize(reference, options))
            .collect::<Result<Vec<_>, _>>()?
    };

    for line in lines {
        println!("{}", line);
    }

    Ok(())
}
