//! Data folder write endpoints
//!
//! Both endpoints change the folder and then rebuild (or reset) the in-memory
//! index, holding `AppState::folder_lock` from the first write to the swap.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use std::path::Path;
use stridex_common::loader::is_supported_name;
use tracing::{info, warn};

use super::error::{ApiError, ApiResult};
use crate::scanner::DataFileScanner;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RejectedFile {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub uploaded_files: Vec<String>,
    pub rejected_files: Vec<RejectedFile>,
    pub total_subjects: usize,
    /// Files in the folder that contributed to the rebuilt index
    pub loaded: usize,
    /// Files in the folder
    pub total: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub removed_files: Vec<String>,
}

/// Bare file name of an uploaded part, or `None` when unusable
fn upload_file_name(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let name = Path::new(&normalized).file_name()?.to_string_lossy().into_owned();
    if name.is_empty() || name.starts_with('.') {
        return None;
    }
    Some(name)
}

/// POST /api/upload
///
/// Accepts `.json`, `.jsonl` and `.ndjson` files (optionally `.gz`) as
/// multipart file parts, stores them in the data folder and rebuilds the index.
/// Parts without a file name are ignored. The whole body is read before the
/// folder is locked.
pub async fn upload_files(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<UploadResponse>> {
    let mut accepted = Vec::new();
    let mut rejected_files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(raw_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let Some(name) = upload_file_name(&raw_name) else {
            rejected_files.push(RejectedFile {
                name: raw_name,
                reason: "invalid file name".to_string(),
            });
            continue;
        };
        if !is_supported_name(&name) {
            warn!(file = %name, "Rejected upload with unsupported extension");
            rejected_files.push(RejectedFile {
                name,
                reason: "unsupported file type".to_string(),
            });
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        accepted.push((name, data));
    }

    if accepted.is_empty() && rejected_files.is_empty() {
        return Err(ApiError::BadRequest("No files provided".to_string()));
    }

    let _folder = state.folder_lock.lock().await;
    let mut uploaded_files = Vec::with_capacity(accepted.len());
    for (name, data) in accepted {
        tokio::fs::write(state.data_folder.join(&name), &data).await?;
        info!(file = %name, bytes = data.len(), "Stored upload");
        uploaded_files.push(name);
    }

    let report = state.rebuild_locked().await?;
    let total_subjects = state.index.read().await.len();

    Ok(Json(UploadResponse {
        success: !uploaded_files.is_empty(),
        uploaded_files,
        rejected_files,
        total_subjects,
        loaded: report.loaded,
        total: report.total,
        errors: report.errors,
    }))
}

/// POST /api/clear-data
///
/// Removes every supported file from the data folder and empties the index.
pub async fn clear_data(State(state): State<AppState>) -> ApiResult<Json<ClearResponse>> {
    let _folder = state.folder_lock.lock().await;
    let folder = state.data_folder.clone();
    let removed_files = tokio::task::spawn_blocking(move || DataFileScanner::new().remove_all(&folder))
        .await
        .map_err(|e| ApiError::Internal(format!("Clear task failed: {}", e)))??;

    state.index.write().await.reset();
    info!(removed = removed_files.len(), "Cleared data folder");

    Ok(Json(ClearResponse {
        success: true,
        removed_files,
    }))
}
