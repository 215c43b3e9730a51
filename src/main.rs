use reviewer_assign::config::Config;
use reviewer_assign::db;
use reviewer_assign::services::reviewer_engine::ReviewerEngine;
use reviewer_assign::services::server::{self, AppState};
use reviewer_assign::services::{PullRequestService, SqliteStore, TeamService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `log` records from the library are forwarded into this subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let pool = db::initialize(&config.database_path).await?;

    let state = AppState {
        pull_requests: PullRequestService::new(
            Arc::new(SqliteStore::new(pool.clone())),
            ReviewerEngine::new(config.max_reviewer_draws),
        ),
        teams: TeamService::new(pool.clone()),
    };
    let app = server::build_router(state, config.request_timeout);

    let listener = TcpListener::bind(config.bind_addr()).await?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("[server] Shutdown requested");
        }
        on_signal.cancel();
    });

    server::serve(listener, app, shutdown).await?;
    pool.close().await;
    Ok(())
}
