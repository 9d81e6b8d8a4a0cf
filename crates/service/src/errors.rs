use thiserror::Error;

use crate::client::ClientError;

/// Errors surfaced by the gift services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("gift already saved for this recipient")]
    AlreadySaved,
    #[error("no record returned by {0}")]
    NoRecord(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{} not found", entity))
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::AlreadySaved => 1002,
            ServiceError::NotFound(_) => 1003,
            ServiceError::NoRecord(_) => 1004,
            ServiceError::Backend(_) => 1100,
            ServiceError::Client(_) => 1101,
            ServiceError::Model(_) => 1200,
        }
    }
}
