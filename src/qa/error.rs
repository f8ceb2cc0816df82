use thiserror::Error;

use crate::core::errors::ApiError;

pub const NO_RELEVANT_MATERIAL: &str = "The source material doesn't contain information relevant to your question. Please try a different question or provide different source material.";

#[derive(Debug, Error)]
pub enum QaError {
    #[error("{0}")]
    Invalid(String),

    #[error("{}", NO_RELEVANT_MATERIAL)]
    NoRelevantMaterial,

    #[error("No answer generated")]
    EmptyAnswer,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<QaError> for ApiError {
    fn from(err: QaError) -> Self {
        match err {
            QaError::Invalid(msg) => ApiError::BadRequest(msg),
            QaError::NoRelevantMaterial => ApiError::BadRequest(NO_RELEVANT_MATERIAL.to_string()),
            QaError::EmptyAnswer => ApiError::Internal("No answer generated".to_string()),
            QaError::Api(inner) => inner,
        }
    }
}
