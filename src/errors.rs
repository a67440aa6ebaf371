use std::collections::BTreeMap;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Client-facing error taxonomy. Everything a handler can fail with maps onto
/// one of these; internal detail stays in the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(BTreeMap<String, String>),

    #[error("invalid or missing authentication token")]
    AuthenticationRequired,

    #[error("your user account doesn't have the necessary permissions to access this resource")]
    PermissionDenied,

    #[error("your user account must be activated to access this resource")]
    InactiveAccount,

    #[error("the requested resource could not be found")]
    NotFound,

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("the server encountered a problem and could not process your request")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    /// Single-field validation failure.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.into());
        ApiError::Validation(errors)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": errors })),
            )
                .into_response(),
            ApiError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ApiError::PermissionDenied | ApiError::InactiveAccount => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": self.to_string() }))).into_response()
            }
            ApiError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": self.to_string() }))).into_response()
            }
            ApiError::EditConflict => {
                (StatusCode::CONFLICT, Json(json!({ "error": self.to_string() }))).into_response()
            }
            ApiError::Internal(err) => {
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "the server encountered a problem and could not process your request" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn statuses_match_taxonomy() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                ApiError::validation("sort", "invalid sort value"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ApiError::AuthenticationRequired, StatusCode::UNAUTHORIZED),
            (ApiError::PermissionDenied, StatusCode::FORBIDDEN),
            (ApiError::InactiveAccount, StatusCode::FORBIDDEN),
            (ApiError::NotFound, StatusCode::NOT_FOUND),
            (ApiError::EditConflict, StatusCode::CONFLICT),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let err = ApiError::Internal(anyhow::anyhow!("pg password=hunter2 refused"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
