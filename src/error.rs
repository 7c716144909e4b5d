use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")] Database(#[from] sea_orm::DbErr),

    #[error("Invalid input: {0}")] InvalidInput(String),

    #[error("Malformed {entity} record {id}: {reason}")] MalformedRecord {
        entity: &'static str,
        id: String,
        reason: String,
    },

    #[error("No recipients found for schedule")]
    NoRecipients,

    #[error("Email error: {0}")] Email(String),

    #[error("WhatsApp error: {0}")] WhatsApp(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Internal error: {0}")] Internal(String),
}

impl AppError {
    pub fn malformed(entity: &'static str, id: impl ToString, reason: impl Into<String>) -> Self {
        AppError::MalformedRecord {
            entity,
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Body returned by the batch endpoints when a run cannot complete.
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl AppError {
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            error: self.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::InvalidInput(_) => axum::http::StatusCode::BAD_REQUEST,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::error!("Request failed: {}", self);

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
