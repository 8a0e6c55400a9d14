//! Subject read endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use stridex_common::meta_labels::LabelSummary;

use super::error::{ApiError, ApiResult};
use crate::AppState;

/// One row of the subject listing
#[derive(Debug, Serialize)]
pub struct SubjectListItem {
    pub id: String,
    /// Short family labels (`IMU`, `PAD`, `INSOLE`)
    pub sensors: Vec<&'static str>,
    pub meta: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct SubjectListResponse {
    pub total: usize,
    pub subjects: Vec<SubjectListItem>,
}

#[derive(Debug, Serialize)]
pub struct LabelSummaryResponse {
    pub id: String,
    pub summary: LabelSummary,
}

/// GET /api/subjects
///
/// Subjects in ascending id order.
pub async fn list_subjects(State(state): State<AppState>) -> Json<SubjectListResponse> {
    let index = state.index.read().await;
    let subjects: Vec<SubjectListItem> = index
        .subjects()
        .map(|s| SubjectListItem {
            id: s.id.clone(),
            sensors: s.sensors().iter().map(|f| f.short_label()).collect(),
            meta: s.meta.clone(),
        })
        .collect();

    Json(SubjectListResponse {
        total: subjects.len(),
        subjects,
    })
}

/// GET /api/subjects/:id (also GET /api/patient/:id)
///
/// Full merged subject: meta, flattened labels, normalized families, gait
/// cycle split and source files.
pub async fn get_subject(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let index = state.index.read().await;
    let subject = index
        .subject(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Subject {}", id)))?;
    let body = serde_json::to_value(subject).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(body))
}

/// GET /api/subjects/:id/labels/summary
pub async fn get_label_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<LabelSummaryResponse>> {
    let index = state.index.read().await;
    let subject = index
        .subject(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Subject {}", id)))?;
    Ok(Json(LabelSummaryResponse {
        id: subject.id.clone(),
        summary: subject.label_summary(),
    }))
}
