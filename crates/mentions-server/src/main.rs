mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use mentions_sources::MentionPipeline;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::CronAuth,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(mentions_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let tracking = Arc::new(mentions_core::load_tracking(&config.tracking_path)?);
    let pipeline = Arc::new(MentionPipeline::from_config(&config, &tracking)?);

    let pool = match config.database_url.as_deref() {
        Some(url) => {
            let pool_config = mentions_db::PoolConfig::from_app_config(&config);
            let pool = mentions_db::connect_pool_lazy(url, pool_config)?;
            // Startup continues without Postgres; reads answer 503 until it is back.
            if let Err(e) = mentions_db::ensure_schema(&pool).await {
                tracing::warn!(error = %e, "could not ensure schema at startup");
            }
            Some(pool)
        }
        None => {
            tracing::info!("DATABASE_URL not set; running in live-only mode");
            None
        }
    };

    let _scheduler = match &pool {
        Some(pool) => Some(
            scheduler::build_scheduler(
                pool.clone(),
                Arc::clone(&pipeline),
                tracking.fetch_config(),
                &config.fetch_cron,
            )
            .await?,
        ),
        None => None,
    };

    let auth = CronAuth::from_config(&config)?;
    let app = build_app(
        AppState {
            pool,
            pipeline,
            tracking,
        },
        auth,
        default_rate_limit_state(),
    );

    tracing::info!(addr = %config.bind_addr, env = %config.env, "mentions-server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
