use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please paste a valid Instagram URL!")]
    InvalidInput,

    #[error("{0}")]
    Server(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid image: {0}")]
    Image(String),

    #[error("Download cancelled")]
    Cancelled,
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::ApiError(message) => AppError::Server(message),
            other => AppError::Transport(other.to_string()),
        }
    }
}
