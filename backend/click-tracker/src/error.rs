use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use durable_queue::QueueError;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error: String,
}

impl ResponseError for TrackerError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            TrackerError::Queue(_) => "unavailable",
            TrackerError::Internal(_) => "error",
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            status,
            error: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::Queue(_) => StatusCode::SERVICE_UNAVAILABLE,
            TrackerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
