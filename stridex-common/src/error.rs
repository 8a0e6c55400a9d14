//! Common error types for StrideX

use thiserror::Error;

/// Common result type for StrideX operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across StrideX crates
///
/// Data problems inside a document (bad lines, wrong shapes, missing ids) are
/// reported as data by the loader and the subject index, not through this type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
