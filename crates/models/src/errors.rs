use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("record has no Id")]
    MissingId,
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("encode error: {0}")]
    Encode(String),
}
