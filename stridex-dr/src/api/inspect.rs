//! Single-document inspection
//!
//! Loads a posted body exactly as a file with the given name would be loaded,
//! without touching the data folder or the subject index.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use stridex_common::load_bytes;

use super::error::{ApiError, ApiResult};
use crate::report::FileReport;
use crate::AppState;

/// Query parameters for inspection
#[derive(Debug, Deserialize)]
pub struct InspectQuery {
    /// File name driving gzip / line-delimited detection
    #[serde(default = "default_name")]
    pub name: String,

    /// Include per-candidate details
    #[serde(default = "default_candidates")]
    pub candidates: bool,
}

fn default_name() -> String {
    "upload.json".to_string()
}

fn default_candidates() -> bool {
    true
}

/// POST /api/inspect?name=<file name>
pub async fn inspect_document(
    State(state): State<AppState>,
    Query(query): Query<InspectQuery>,
    body: Bytes,
) -> ApiResult<Json<FileReport>> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty request body".to_string()));
    }

    let limits = state.limits;
    let report = tokio::task::spawn_blocking(move || {
        let outcome = load_bytes(&query.name, &body);
        FileReport::build(&outcome, &limits, query.candidates)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Inspection task failed: {}", e)))?;

    Ok(Json(report))
}
