use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Client input rejected before any work is done (→ 400).
    #[error("{0}")]
    InvalidInput(String),
    /// Detector handle was never installed (→ 500).
    #[error("Model not loaded. Please check if {0} exists.")]
    ModelUnavailable(String),
    /// Inference, annotation or artifact I/O failed (→ 500).
    #[error("{0}")]
    DetectionFailed(String),
    #[error("File is too large. Maximum size is {0}MB")]
    PayloadTooLarge(u64),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    OperationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
