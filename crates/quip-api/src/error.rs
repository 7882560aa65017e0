use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use serde_json::json;

/// Request-shape and authorization failures thrown by handlers: the single
/// boundary layer keyed on error kind. Recoverable form-input problems are
/// returned as data instead (see [`bad_request`]).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// A mutating handler was hit without a valid session; answered with a
    /// redirect to the login page carrying the way back.
    #[error("login required")]
    LoginRequired { redirect_to: String },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::LoginRequired { .. } => StatusCode::SEE_OTHER,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::LoginRequired { .. } => "LOGIN_REQUIRED",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Log the real cause but return a generic message
        tracing::error!("internal error: {:#}", err);
        ApiError::internal("An error occurred while processing your request")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::LoginRequired { redirect_to } = &self {
            return Redirect::to(&format!("/login?redirectTo={redirect_to}")).into_response();
        }

        let status = self.status_code();
        let body = json!({
            "error": true,
            "message": self.to_string(),
            "code": self.error_code(),
        });

        (status, Json(body)).into_response()
    }
}

/// Error channel for recoverable user input: validation results travel back
/// as a 400 with the action data so the form re-renders with prior values.
pub fn bad_request<T: Serialize>(data: T) -> Response {
    (StatusCode::BAD_REQUEST, Json(data)).into_response()
}
