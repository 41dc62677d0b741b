//! Error types for the geosurvey analytics engine.

use thiserror::Error;

/// Errors produced by the analytics engine.
///
/// Data-driven edge cases (malformed zones, too few points, degenerate
/// statistics) never surface here; they resolve to documented empty or
/// fallback results. Errors are reserved for programmer mistakes and
/// collaborator failures.
#[derive(Debug, Error)]
pub enum GeoSurveyError {
    /// A call-level parameter is invalid (non-positive epsilon or cell
    /// size, zero `min_points`).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A point or zone store failed to produce a snapshot.
    #[error("store error: {0}")]
    Store(String),
}

/// Convenience result type used throughout the crate.
pub type Result<T> = std::result::Result<T, GeoSurveyError>;
