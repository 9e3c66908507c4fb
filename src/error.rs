use actix_web::{HttpResponse, ResponseError};
use reqwest::StatusCode;
use serde_json::json;

use crate::kmb::error::KmbError;

#[derive(thiserror::Error, Debug)]
pub enum EtabusError {
    /// A deliberate HTTP error: client errors, not-found, and upstream
    /// statuses forwarded verbatim.
    #[error("Error response: {0} {1}")]
    Response(u16, String),

    #[error("KMB error: {0}")]
    Kmb(KmbError),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

impl From<KmbError> for EtabusError {
    fn from(error: KmbError) -> Self {
        match error {
            // Non-success upstream statuses are forwarded, not generalized.
            KmbError::Status(status) => EtabusError::Response(
                status.as_u16(),
                format!("Error fetching KMB data: {}", status_text(status)),
            ),
            other => EtabusError::Kmb(other),
        }
    }
}

impl ResponseError for EtabusError {
    fn error_response(&self) -> actix_web::HttpResponse<actix_web::body::BoxBody> {
        match self {
            EtabusError::Response(_, message) => {
                HttpResponse::build(self.status_code()).json(json!({ "error": message }))
            }
            other => {
                log::error!("{}", other);
                HttpResponse::InternalServerError()
                    .json(json!({ "error": "Error getting KMB bus data" }))
            }
        }
    }

    fn status_code(&self) -> reqwest::StatusCode {
        match self {
            EtabusError::Response(status, _) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Reason phrase for an upstream status, the closest analogue of a fetch
/// response's statusText.
pub fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

pub type EtabusResult<T> = Result<T, EtabusError>;
