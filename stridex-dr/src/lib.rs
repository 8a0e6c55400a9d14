//! stridex-dr library - gait data review service
//!
//! Serves the subjects merged from the files in a data folder as JSON, and
//! accepts new files for that folder.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use stridex_common::{DiscoveryLimits, IngestReport, SubjectIndex};
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod api;
pub mod report;
pub mod scanner;

use api::ApiError;
use scanner::DataFileScanner;

/// Largest accepted request body (uploads and inspection)
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Subjects merged from the data folder
    pub index: Arc<RwLock<SubjectIndex>>,
    /// Folder holding the input files
    pub data_folder: PathBuf,
    /// Bounds for candidate discovery
    pub limits: DiscoveryLimits,
    /// Held from any data folder write through the index swap that follows it
    pub folder_lock: Arc<Mutex<()>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state with an empty index
    pub fn new(data_folder: PathBuf, limits: DiscoveryLimits) -> Self {
        Self {
            index: Arc::new(RwLock::new(SubjectIndex::new())),
            data_folder,
            limits,
            folder_lock: Arc::new(Mutex::new(())),
            started_at: Utc::now(),
        }
    }

    /// Rebuild the index from the data folder
    ///
    /// The new index is built off to the side and swapped in whole; readers
    /// never see a partially merged folder. Rebuilds and folder writes are
    /// serialized on `folder_lock`.
    pub async fn rebuild_index(&self) -> Result<IngestReport, ApiError> {
        let _folder = self.folder_lock.lock().await;
        self.rebuild_locked().await
    }

    /// Rebuild with `folder_lock` already held by the caller
    pub(crate) async fn rebuild_locked(&self) -> Result<IngestReport, ApiError> {
        let folder = self.data_folder.clone();
        let (index, report) = tokio::task::spawn_blocking(move || {
            let files = DataFileScanner::new().scan(&folder)?;
            let mut index = SubjectIndex::new();
            let report = index.ingest_paths(&files);
            Ok::<_, scanner::ScanError>((index, report))
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Index rebuild task failed: {}", e)))??;

        let subjects = index.len();
        *self.index.write().await = index;
        info!(
            subjects,
            loaded = report.loaded,
            total = report.total,
            "Rebuilt subject index ({})",
            report.headline()
        );
        Ok(report)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let subject_routes = Router::new()
        .route("/api/subjects", get(api::list_subjects))
        .route("/api/subjects/:id", get(api::get_subject))
        .route("/api/patient/:id", get(api::get_subject))
        .route("/api/subjects/:id/labels/summary", get(api::get_label_summary))
        .route("/api/catalog", get(api::get_catalog))
        .route("/api/inspect", post(api::inspect_document))
        .route("/api/upload", post(api::upload_files))
        .route("/api/clear-data", post(api::clear_data));

    Router::new()
        .merge(subject_routes)
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
