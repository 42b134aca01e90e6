use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront_server::config::{AppConfig, CliConfig, FileConfig};
use storefront_server::engagement::RetryPolicy;
use storefront_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use storefront_server::storefront_store::{LikeMode, SqliteStorefrontStore, StorefrontStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite storefront database file, created if missing.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Optional TOML config file. Its values override the CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of config responses in the cache in seconds.
    #[clap(long, default_value_t = 60)]
    pub content_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// How likes are stored: counter_only or recorded.
    #[clap(long, default_value = "recorded")]
    pub like_mode: LikeMode,

    /// Interval in hours between like counter reconciliations. Set to 0 to disable.
    #[clap(long, default_value_t = 24)]
    pub like_reconcile_interval_hours: u64,
}

fn spawn_like_reconciliation(
    store: Arc<dyn StorefrontStore>,
    interval_hours: u64,
    retry: RetryPolicy,
) {
    info!(
        "Like counter reconciliation enabled: every {} hours",
        interval_hours
    );

    tokio::spawn(async move {
        let interval = Duration::from_secs(interval_hours * 60 * 60);
        let mut ticker = tokio::time::interval(interval);

        // Skip the first immediate tick, wait for the first interval
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let mut retry_count = 0;
            loop {
                match store.reconcile_like_counts().await {
                    Ok(count) => {
                        if count > 0 {
                            info!("Repaired {} drifted like counters", count);
                        }
                        break;
                    }
                    Err(e) if retry.should_retry(&e, retry_count) => {
                        let wait = retry.backoff(retry_count);
                        warn!("Like reconciliation failed ({}), retrying in {:?}", e, wait);
                        tokio::time::sleep(wait).await;
                        retry_count += 1;
                    }
                    Err(e) => {
                        error!("Failed to reconcile like counters: {}", e);
                        break;
                    }
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        content_cache_age_sec: cli_args.content_cache_age_sec,
        frontend_dir_path: cli_args.frontend_dir_path,
        like_mode: cli_args.like_mode,
        like_reconcile_interval_hours: cli_args.like_reconcile_interval_hours,
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening SQLite storefront database at {:?} ({} likes)...",
        app_config.db_path, app_config.like_mode
    );
    let store: Arc<dyn StorefrontStore> = Arc::new(SqliteStorefrontStore::new(
        &app_config.db_path,
        app_config.like_mode,
    )?);

    if app_config.like_mode == LikeMode::Recorded && app_config.like_reconcile_interval_hours > 0 {
        spawn_like_reconciliation(
            store.clone(),
            app_config.like_reconcile_interval_hours,
            RetryPolicy::new(&app_config.retry),
        );
    }

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level,
        port: app_config.port,
        content_cache_age_sec: app_config.content_cache_age_sec,
        frontend_dir_path: app_config.frontend_dir_path,
        like_mode: app_config.like_mode,
    };

    info!("Ready to serve at port {}!", server_config.port);
    run_server(server_config, store).await
}
