//! HTTP API handlers for stridex-dr

pub mod catalog;
pub mod data;
pub mod error;
pub mod health;
pub mod inspect;
pub mod subjects;

pub use catalog::get_catalog;
pub use data::{clear_data, upload_files};
pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use inspect::inspect_document;
pub use subjects::{get_label_summary, get_subject, list_subjects};
