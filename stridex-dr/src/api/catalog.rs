//! Metric catalog endpoint

use axum::Json;
use serde::Serialize;
use stridex_common::catalog::{catalog_for, MetricDescriptor};
use stridex_common::SensorFamily;

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub imu: &'static [MetricDescriptor],
    pub gait_pad: &'static [MetricDescriptor],
    pub smart_insole: &'static [MetricDescriptor],
}

/// GET /api/catalog
pub async fn get_catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        imu: catalog_for(SensorFamily::Imu),
        gait_pad: catalog_for(SensorFamily::GaitPad),
        smart_insole: catalog_for(SensorFamily::SmartInsole),
    })
}
