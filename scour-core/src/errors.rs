//! errors.rs - Custom error types for the scour-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//! Per-value cleaning never errors; the variants here cover configuration
//! and lookup failures only.
//!
//! License: MIT OR Apache-2.0

use thiserror::Error;

/// This enum represents all possible error types in the `scour-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions. This prevents them from
/// matching all variants exhaustively, thus avoiding breaking changes.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScourError {
    #[error("Invalid filter configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No handler registered for type '{0}'")]
    HandlerNotFound(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),
}
