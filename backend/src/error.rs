use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::inference::model::InferenceError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),
    #[error("Upload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }
}
