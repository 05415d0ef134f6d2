pub(crate) mod correction;
pub(crate) mod notifications;
pub(crate) mod scoring;
pub(crate) mod submission;

use thiserror::Error;

/// Domain failures raised by the submission and correction processors. Every
/// variant surfaced after `begin()` drops the transaction un-committed, so no
/// partial writes survive.
#[derive(Debug, Error)]
pub(crate) enum GradingError {
    #[error("{0}")]
    Authorization(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Persistence(#[from] sqlx::Error),
}
