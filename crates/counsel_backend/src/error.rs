use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("write to {path} rejected: {reason}")]
    Rejected { path: String, reason: String },
    #[error("document {0} not found")]
    NotFound(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
