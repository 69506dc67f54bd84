use std::sync::Arc;
use std::time::Duration;

use okusuri_common::config::AppConfig;
use okusuri_common::db;
use okusuri_common::redis_pool::create_redis_pool;
use okusuri_engine::clock::SystemClock;
use okusuri_engine::directory::PgDirectory;
use okusuri_engine::dispatch::DispatchCoordinator;
use okusuri_engine::throttle::{RedisThrottle, SendThrottle, Throttle};
use okusuri_notifier::WebPushSender;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "okusuri_notifier=info,okusuri_engine=info".into()),
        )
        .json()
        .init();

    tracing::info!("Okusuri notifier starting...");

    // Load configuration; without push credentials nothing can be sent
    let config = AppConfig::from_env()?;
    let sender = WebPushSender::from_config(&config)?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    let throttle: Arc<dyn Throttle> = match &config.redis_url {
        Some(url) => {
            let redis = create_redis_pool(url).await?;
            tracing::info!("Using Redis send cooldown");
            Arc::new(RedisThrottle::new(redis, config.throttle_cooldown_secs))
        }
        None => Arc::new(SendThrottle::with_cooldown_secs(
            config.throttle_cooldown_secs,
        )),
    };

    let directory = Arc::new(PgDirectory::new(pool));
    let coordinator = DispatchCoordinator::new(
        directory.clone(),
        directory,
        Arc::new(sender),
        throttle,
        Arc::new(SystemClock),
    );

    let Some(interval_secs) = config.notifier_interval_secs else {
        coordinator.run().await?;
        tracing::info!("Okusuri notifier finished.");
        return Ok(());
    };

    tracing::info!(interval_secs, "Running reminder dispatch on an interval");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    // Run with graceful shutdown on Ctrl+C
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = coordinator.run().await {
                    tracing::error!(error = %e, "Reminder run failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal, stopping gracefully...");
                break;
            }
        }
    }

    tracing::info!("Okusuri notifier stopped.");
    Ok(())
}
