//! Error taxonomy for the advisory pipeline.
//!
//! - `Configuration`: missing or malformed model artifact at startup.
//!   Fatal; the process must not serve traffic.
//! - `Validation`: request field out of domain. Surfaced to the caller,
//!   no prediction attempted.
//! - `Inference`: unexpected model-call failure (shape mismatch, corrupt
//!   artifact). Surfaced as a failed advisory, no partial result.
//!
//! Unseen categorical values are NOT errors: the encoder falls back to
//! code 0 and flags the column (see `encoding`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Artifact store missing or corrupt at startup — fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Request field out of domain — no prediction attempted.
    #[error("validation error: {0}")]
    Validation(String),

    /// Model call failed unexpectedly — no partial results returned.
    #[error("inference error: {0}")]
    Inference(String),
}

impl From<sled::Error> for AdvisorError {
    fn from(err: sled::Error) -> Self {
        Self::Configuration(format!("artifact store: {err}"))
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(format!("artifact serialization: {err}"))
    }
}
