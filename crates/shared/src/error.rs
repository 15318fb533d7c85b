use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ApiException> for ApiError {
    fn from(value: ApiException) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSortError {
    #[error("unknown sort axis '{0}', expected 'date' or 'title'")]
    Axis(String),
    #[error("unknown sort direction '{0}', expected 'asc' or 'desc'")]
    Direction(String),
    #[error("unknown sort action '{0}', expected e.g. 'date-asc' or 'title-desc'")]
    Action(String),
}

impl From<ParseSortError> for ApiException {
    fn from(value: ParseSortError) -> Self {
        ApiException::new(ErrorCode::Validation, value.to_string())
    }
}
