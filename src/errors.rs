// src/errors.rs
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResizerError {
    #[error("url shouldn't be empty")]
    EmptyUrl,

    #[error("url can't be parsed: {0}")]
    UrlParse(String),

    #[error("scheme '{0}' isn't allowed")]
    InvalidScheme(String),

    #[error("host '{0}' isn't allowed")]
    InvalidHost(String),

    #[error("size {0} * {1} isn't allowed")]
    InvalidSize(i64, i64),

    #[error("method '{0}' isn't allowed")]
    InvalidMethod(String),

    #[error("format '{0}' isn't allowed")]
    InvalidFormat(String),

    #[error("quality {0} isn't allowed")]
    InvalidQuality(i64),

    #[error("parameter {0}='{1}' should be an integer")]
    InvalidParameter(&'static str, String),

    #[error("invalid orientation tag {0}")]
    Orientation(u32),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Fetch timed out: {0}")]
    FetchTimeout(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ResizerError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ResizerError::EmptyUrl
                | ResizerError::UrlParse(_)
                | ResizerError::InvalidScheme(_)
                | ResizerError::InvalidHost(_)
                | ResizerError::InvalidSize(..)
                | ResizerError::InvalidMethod(_)
                | ResizerError::InvalidFormat(_)
                | ResizerError::InvalidQuality(_)
                | ResizerError::InvalidParameter(..)
        )
    }

    fn category(&self) -> &'static str {
        match self {
            _ if self.is_validation() => "Validation error",
            ResizerError::Orientation(_) => "Orientation error",
            ResizerError::Geometry(_) => "Geometry error",
            ResizerError::Fetch(_) | ResizerError::FetchTimeout(_) => "Fetch error",
            ResizerError::ImageProcessing(_) => "Image processing error",
            ResizerError::Redis(_) => "Database error",
            ResizerError::Storage(_) => "Storage error",
            _ => "Data processing error",
        }
    }
}

impl ResponseError for ResizerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ResizerError::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ResizerError::Redis(_) | ResizerError::Storage(_) | ResizerError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.category(),
            "message": self.to_string()
        }))
    }
}
