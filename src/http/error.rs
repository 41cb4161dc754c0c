use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::core::items::ItemError;
use crate::errors::AppError;

/// Every failure a handler can report. Rendered as `{"error": "<message>"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing data")]
    MissingData,

    #[error("Data validation error")]
    Validation,

    #[error("Invalid data")]
    InvalidData,

    #[error("ID not found")]
    NotFound,

    #[error("Invalid login")]
    InvalidLogin,

    #[error("Login required")]
    LoginRequired,

    #[error("CSRF verification failed")]
    Csrf,

    #[error("Request method not allowed")]
    MethodNotAllowed,

    #[error("Not found")]
    RouteNotFound,

    #[error("Internal error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingData | ApiError::Validation | ApiError::InvalidData => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidLogin | ApiError::LoginRequired => StatusCode::UNAUTHORIZED,
            ApiError::Csrf => StatusCode::FORBIDDEN,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!("Request failed: {detail}");
        }

        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<ItemError> for ApiError {
    fn from(e: ItemError) -> Self {
        match e {
            ItemError::MissingData(_) => ApiError::MissingData,
            ItemError::Validation(_) => ApiError::Validation,
            ItemError::InvalidData(_) => ApiError::InvalidData,
            ItemError::NotFound(_) => ApiError::NotFound,
            ItemError::Db(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::NotFound(_) => ApiError::NotFound,
            AppError::Validation(_) | AppError::Deserialize(_) => ApiError::Validation,
            other => ApiError::Internal(other.to_string()),
        }
    }
}
