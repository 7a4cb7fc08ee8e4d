// Centralized error handling for the presence board

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors raised by the user store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User ID '{0}' is already registered")]
    DuplicateUserId(String),

    #[error("User {0} not found")]
    NotFound(u32),

    #[error("Storage unavailable: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Errors raised while storing or removing a profile picture
#[derive(Error, Debug)]
pub enum PictureError {
    #[error("Uploaded file is not a usable image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Uploaded file is larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Picture path escapes the image directory: {0}")]
    InvalidPath(String),

    #[error("Failed to access picture file: {0}")]
    Io(#[from] std::io::Error),
}

impl PictureError {
    /// Message safe to show next to the upload field
    pub fn user_message(&self) -> String {
        match self {
            PictureError::Image(_) => "The uploaded file could not be read as an image".to_string(),
            PictureError::TooLarge { limit } => {
                format!("The image must be smaller than {} KB", limit / 1024)
            }
            PictureError::InvalidPath(_) | PictureError::Io(_) => {
                "The image could not be saved, please try again".to_string()
            }
        }
    }
}

/// Errors that end a request with a generic failure page
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("File error: {0}")]
    FileIo(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Storage(e) => AppError::Storage(format!("{:#}", e)),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PictureError> for AppError {
    fn from(err: PictureError) -> Self {
        AppError::FileIo(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Details stay in the log; the browser only sees a generic page
        let (status, message) = match &self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "The request could not be processed."),
            AppError::Storage(_) | AppError::FileIo(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again later.",
            ),
        };

        error!(error = %self, status = status.as_u16(), "Request failed");

        let body = format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Error</title></head>\
             <body><h1>{}</h1><p>{}</p><p><a href=\"/index\">Back to the board</a></p></body></html>",
            status.as_u16(),
            message
        );

        (status, Html(body)).into_response()
    }
}
