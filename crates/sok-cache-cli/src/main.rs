//! sok-cache - command-line host for the SOK Beauty offline cache proxy.
//!
//! The binary plays the part of the browser host: it keeps cache stores on
//! disk, performs real HTTP fetches against the site origin, and delivers
//! install/fetch/activate signals to the proxy.

mod cli;
mod config;

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sok_cache_core::{
    CacheRequest, CacheStorage, CacheStore, DiskCacheStorage, EventOutcome, HttpNetwork,
    LifecycleEvent, OfflineCacheProxy,
};

use cli::Command;
use config::Config;

type Proxy = OfflineCacheProxy<DiskCacheStorage, HttpNetwork>;

/// Log file name prefix inside the log directory (rotated daily)
const LOG_FILE_PREFIX: &str = "sok-cache.log";

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug). Events go to
/// stderr and, when the log directory is usable, to a daily log file. The
/// returned guard must stay alive for the file writer to flush.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let command = cli::parse_args(std::env::args().skip(1))?;
    if command == Command::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    let _log_guard = init_tracing(config.log_dir().ok().as_deref());
    let config = config.with_origin_override(std::env::var(config::ORIGIN_ENV).ok());
    info!(cache = %config.cache_name, origin = %config.origin, "sok-cache starting");

    if command == Command::Bump {
        return bump_cache_version();
    }

    let proxy = register(&config).await?;

    match command {
        Command::Install => install(&proxy).await,
        Command::Fetch {
            url,
            method,
            print_body,
        } => fetch(&proxy, CacheRequest::new(&method, url), print_body).await,
        Command::Activate => activate(&proxy).await,
        Command::Status => status(&proxy, &config).await,
        Command::Help | Command::Bump => Ok(()),
    }
}

/// Build the proxy over the on-disk stores and pick up any earlier install.
async fn register(config: &Config) -> Result<Proxy> {
    let result = async {
        let storage = DiskCacheStorage::new(config.store_dir()?)?;
        let network = HttpNetwork::new(&config.origin, config.request_timeout())?;
        let proxy = OfflineCacheProxy::new(
            storage,
            network,
            config.manifest.clone(),
            config.cache_name.clone(),
        )
        .with_options(config.proxy_options())
        .resume()
        .await?;
        anyhow::Ok(proxy)
    }
    .await;

    match &result {
        Ok(proxy) => {
            let state = proxy.state().await;
            info!(cache = %proxy.cache_name(), state = %state, "Proxy registered");
        }
        Err(e) => warn!(error = %e, "Proxy registration failed"),
    }
    result.context("Failed to register cache proxy")
}

async fn install(proxy: &Proxy) -> Result<()> {
    match proxy.dispatch(LifecycleEvent::Install).await? {
        EventOutcome::Installed(report) => {
            println!("Installed {} assets into {}", report.cached.len(), report.cache_name);
            for url in &report.cached {
                println!("  {}", url);
            }
        }
        other => warn!(outcome = ?other, "Unexpected install outcome"),
    }
    Ok(())
}

async fn fetch(proxy: &Proxy, request: CacheRequest, print_body: bool) -> Result<()> {
    let outcome = match proxy.dispatch(LifecycleEvent::Fetch(request.clone())).await? {
        EventOutcome::Fetched(outcome) => outcome,
        other => anyhow::bail!("Unexpected fetch outcome: {:?}", other),
    };

    eprintln!(
        "{} {} from {} ({} bytes)",
        request,
        outcome.response.status,
        outcome.source,
        outcome.response.content_length()
    );

    if print_body {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&outcome.response.body)?;
        stdout.flush()?;
    }
    Ok(())
}

async fn activate(proxy: &Proxy) -> Result<()> {
    match proxy.dispatch(LifecycleEvent::Activate).await? {
        EventOutcome::Activated(deleted) if deleted.is_empty() => {
            println!("No stale caches");
        }
        EventOutcome::Activated(deleted) => {
            for name in deleted {
                println!("Deleted {}", name);
            }
        }
        other => warn!(outcome = ?other, "Unexpected activate outcome"),
    }
    Ok(())
}

async fn status(proxy: &Proxy, config: &Config) -> Result<()> {
    println!("Origin:     {}", config.origin);
    println!("Cache name: {}", proxy.cache_name());
    let state = proxy.state().await;
    println!("State:      {}", state);
    println!("Manifest:   {} assets", proxy.manifest().len());

    let storage = proxy.storage();
    let names = storage.keys().await?;
    if names.is_empty() {
        println!("Stores:     none");
        return Ok(());
    }

    println!("Stores:");
    let current = proxy.cache_name().to_string();
    for name in names {
        let marker = if name == current { " (current)" } else { "" };
        let store = storage.open(&name).await?;
        let entries = store.entries().await?;
        println!("  {}{} - {} entries", name, marker, entries.len());
        for entry in entries {
            println!(
                "    {} {} {} bytes, {}",
                entry.request,
                entry.response.status,
                entry.response.content_length(),
                entry.age_display()
            );
        }
    }
    Ok(())
}

/// Rewrite the config file with the next cache version.
/// Reads the file directly so environment overrides are not persisted.
fn bump_cache_version() -> Result<()> {
    let mut config = Config::load()?;
    let previous = config.cache_name.clone();
    config.cache_name = previous.bump();
    config.save()?;
    info!(from = %previous, to = %config.cache_name, "Cache version bumped");
    println!("Cache name: {} -> {}", previous, config.cache_name);
    println!("Run `sok-cache install` and then `sok-cache activate` to replace the old cache.");
    Ok(())
}
