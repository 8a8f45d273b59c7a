use std::sync::Arc;

use syllabi_cloud::Presigner;
use syllabi_events::{JobQueue, Notifier};

use crate::config::ServerConfig;
use crate::upload::UploadOrchestrator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: syllabi_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Storage signer, used directly for download URLs.
    pub presigner: Arc<dyn Presigner>,
    /// Intake, confirmation and verification of uploads.
    pub uploads: Arc<UploadOrchestrator>,
}

impl AppState {
    /// Wire the collaborators into the state and its orchestrator.
    pub fn new(
        pool: syllabi_db::DbPool,
        config: Arc<ServerConfig>,
        presigner: Arc<dyn Presigner>,
        queue: Arc<dyn JobQueue>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let uploads = Arc::new(UploadOrchestrator::new(
            pool.clone(),
            Arc::clone(&config),
            Arc::clone(&presigner),
            queue,
            notifier,
        ));
        Self {
            pool,
            config,
            presigner,
            uploads,
        }
    }
}
