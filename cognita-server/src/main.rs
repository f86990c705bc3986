use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cognita_core::{QuizBuilder, SystemClock};
use cognita_persistence::DatabaseManager;
use cognita_server::{
    auth::AuthService, config::Config, create_routes, sessions::SessionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Cognita server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database connection and run migrations
    let database = match DatabaseManager::connect(&config.database_url).await {
        Ok(database) => database,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    if !config.atomic_procedures {
        info!("Atomic stats procedures disabled - using read-modify-write fallbacks");
    }
    let clock = Arc::new(SystemClock);
    let stats_store = Arc::new(database.stats_repository(clock.clone(), config.atomic_procedures));
    let session_manager = Arc::new(SessionManager::new(stats_store, clock));
    let flashcard_repository = Arc::new(database.flashcard_repository());

    let auth_service = match (&config.jwt_secret, config.auth_dev_mode) {
        (_, true) => {
            info!("Starting in development authentication mode - JWT validation disabled");
            Arc::new(AuthService::new_dev_mode())
        }
        (Some(secret), false) => Arc::new(AuthService::new(secret, config.jwt_audience.clone())),
        (None, false) => {
            tracing::error!("JWT_SECRET must be set unless AUTH_DEV_MODE=true");
            std::process::exit(1);
        }
    };

    let routes = create_routes(
        session_manager.clone(),
        flashcard_repository,
        auth_service,
        Arc::new(QuizBuilder::new(config.quiz_max_questions)),
    );

    // Start cleanup task
    let cleanup_session_manager = session_manager.clone();
    let session_timeout = Duration::from_secs(config.session_timeout_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let expired = cleanup_session_manager
                .cleanup_inactive_sessions(session_timeout)
                .await;
            if expired > 0 {
                info!("Expired {} inactive sessions", expired);
            }
        }
    });

    let host = match config.host.parse::<std::net::IpAddr>() {
        Ok(host) => host,
        Err(e) => {
            tracing::error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    info!("Server starting on {}:{}", config.host, config.port);

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown((host, config.port), shutdown_signal());

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    // Wait for SIGINT (Ctrl+C) or SIGTERM
    #[cfg(unix)]
    {
        let (Ok(mut sigint), Ok(mut sigterm)) = (
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
            signal::unix::signal(signal::unix::SignalKind::terminate()),
        ) else {
            tracing::warn!("Failed to install signal handlers, falling back to Ctrl+C");
            let _ = signal::ctrl_c().await;
            return;
        };

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl+c: {}", e);
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
