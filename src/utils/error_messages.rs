//! Represents all possible errors returned by the HTTP API
//!
//! Every error body carries `success: false`. Client and server errors add
//! the failure detail under `error`, authentication failures only a generic
//! `message`, and missing resources nothing else.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::database::StoreError;
use crate::services::ServiceError;

pub const LOGIN_ERROR: &str = "Invalid credentials";

pub const REGISTRATION_ERROR: &str = "Account validation failed";

pub const ADMISSION_ERROR: &str = "Patient validation failed";

pub const VITAL_ERROR: &str = "Vital reading validation failed";

pub const DISCHARGE_ERROR: &str = "Discharge request is invalid";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{}", LOGIN_ERROR)]
    Unauthorized,
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Erreur de validation, préfixée par le contexte de la requête
    pub fn invalid(context: &str, detail: impl std::fmt::Display) -> Self {
        AppError::BadRequest(format!("{context}: {detail}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": detail }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "success": false, "message": LOGIN_ERROR }),
            ),
            AppError::NotFound => (StatusCode::NOT_FOUND, json!({ "success": false })),
            AppError::Internal(detail) => {
                error!("Request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": detail }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => AppError::Unauthorized,
            ServiceError::PatientNotFound => AppError::NotFound,
            ServiceError::Store(e @ StoreError::DuplicateKey { .. }) => AppError::BadRequest(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}
