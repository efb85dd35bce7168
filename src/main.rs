use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use release_watch::check::{CheckOptions, check};
use release_watch::config::{CheckConfig, db_path, default_cache_path, timeout_from_millis};
use release_watch::version::cache::SqliteCache;

#[derive(Parser)]
#[command(name = "release-watch")]
#[command(version, about = "Check GitHub for a newer release of an application")]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report a release newer than the given version
    Check(CheckArgs),
    /// Print the default cache file for a repository slug
    CachePath { slug: String },
}

#[derive(Args)]
struct CheckArgs {
    /// Version of the running program, e.g. v1.2.3
    #[arg(long)]
    current: String,

    /// GitHub repository slug, e.g. owner/repo
    #[arg(long)]
    slug: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON cache file
    #[arg(long, conflicts_with = "db")]
    cache: Option<PathBuf>,

    /// Keep the cache in a SQLite database (the shared database if no path)
    #[arg(long, num_args = 0..=1)]
    db: Option<Option<PathBuf>>,

    /// Hours between release source lookups
    #[arg(long)]
    interval_hours: Option<u64>,

    /// Fetch timeout in milliseconds; negative disables it
    #[arg(long, allow_hyphen_values = true)]
    timeout_ms: Option<i64>,

    /// GitHub API base URL
    #[arg(long)]
    api_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Command::Check(args) => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(run_check(args)),
        Command::CachePath { slug } => {
            println!("{}", default_cache_path(&slug).display());
            Ok(())
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("log file path has no file name: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

fn interval_from_hours(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(60 * 60))
}

async fn run_check(args: CheckArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => CheckConfig::from_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => CheckConfig::default(),
    };

    let mut options = CheckOptions::from_config(&args.current, &config);
    if let Some(slug) = &args.slug {
        options = options.slug(slug);
    }
    if let Some(hours) = args.interval_hours {
        options = options.check_interval(interval_from_hours(hours));
    }
    if let Some(ms) = args.timeout_ms {
        options = options.timeout(timeout_from_millis(ms));
    }
    if let Some(api_url) = &args.api_url {
        options = options.api_url(api_url);
    }
    if let Some(cache) = args.cache {
        options = options.cache_path(cache);
    }
    if let Some(db) = args.db {
        let path = db.unwrap_or_else(db_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let key = options
            .slug
            .clone()
            .context("--db needs a repository slug to key the cache")?;
        let store = SqliteCache::new(&path, &key)
            .with_context(|| format!("open database {}", path.display()))?;
        options.cache_path = None;
        options = options.cache(Arc::new(store));
    }

    let mut pending = check(options)?;

    if let Some(version) = pending.get().await {
        println!("new release available: {version}");
    }
    Ok(())
}
