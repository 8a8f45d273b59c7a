use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use syllabi_api::background::unconfirmed_sweep;
use syllabi_api::config::ServerConfig;
use syllabi_api::router::build_app_router;
use syllabi_api::state::AppState;
use syllabi_cloud::{Presigner, S3Config, S3Presigner};
use syllabi_events::{
    EmailConfig, EmailNotifier, HttpJobQueue, JobQueue, LocalDelayQueue, LogNotifier, Notifier,
    QueueConfig, WebhookDelivery,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "syllabi_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        environment = %config.environment,
        verification_delay_secs = config.upload.verification_delay_secs(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = syllabi_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    syllabi_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    syllabi_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Storage signer ---
    let presigner: Arc<dyn Presigner> = Arc::new(
        S3Presigner::new(S3Config::from_env())
            .await
            .expect("Failed to configure S3 presigner"),
    );

    // --- Job queue ---
    let (queue, local_queue): (Arc<dyn JobQueue>, Option<Arc<LocalDelayQueue>>) =
        match QueueConfig::from_env() {
            Some(queue_config) => {
                tracing::info!(url = %queue_config.url, "Using HTTP queue gateway");
                let queue = HttpJobQueue::new(queue_config);
                (Arc::new(queue), None)
            }
            None => {
                tracing::warn!(
                    "QUEUE_URL not set, verification jobs run in-process and do not survive restarts"
                );
                let local = Arc::new(LocalDelayQueue::new(WebhookDelivery::new()));
                (Arc::clone(&local) as Arc<dyn JobQueue>, Some(local))
            }
        };

    // --- Notifier ---
    let notifier: Arc<dyn Notifier> = match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!(smtp_host = %email_config.smtp_host, "Email notifications enabled");
            Arc::new(EmailNotifier::new(email_config))
        }
        None => {
            tracing::info!("SMTP_HOST not set, notifications are logged only");
            Arc::new(LogNotifier)
        }
    };

    // --- App state ---
    let config = Arc::new(config);
    let state = AppState::new(pool, Arc::clone(&config), presigner, queue, notifier);

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let sweep_handle = tokio::spawn(unconfirmed_sweep::run(
        Arc::clone(&state.uploads),
        Duration::from_secs(config.sweep_interval_secs),
        cancel.clone(),
    ));
    tracing::info!("Unconfirmed upload sweep spawned");

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let deadline = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(deadline, sweep_handle).await.is_err() {
        tracing::warn!("Unconfirmed upload sweep did not stop before the shutdown timeout");
    }

    if let Some(local) = local_queue {
        tracing::info!(pending = local.pending(), "Stopping in-process delay queue");
        if tokio::time::timeout(deadline, local.shutdown()).await.is_err() {
            tracing::warn!("Delay queue did not drain before the shutdown timeout");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
