// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (media upload service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body. The status code in the body always
    /// matches the wire status, never a generic 500.
    pub fn to_json(&self) -> Value {
        json!({
            "status_code": self.status_code(),
            "message": self.message(),
            "code": self.error_code(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    /// Map a unique-constraint violation to 409 with the given message;
    /// everything else goes through the standard sqlx mapping
    pub fn from_sqlx_with_conflict(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::conflict(message)
            }
            _ => ApiError::from(err),
        }
    }
}

// Convert other error types to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                tracing::error!("Database connectivity error: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            other => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::db::DbError> for ApiError {
    fn from(err: crate::db::DbError) -> Self {
        match err {
            crate::db::DbError::ConfigMissing(name) => {
                tracing::error!("Missing configuration: {}", name);
                ApiError::service_unavailable("Database not configured")
            }
            crate::db::DbError::Sqlx(e) => e.into(),
        }
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        match err {
            // An unset token secret is operator misconfiguration, not a
            // credential problem
            crate::auth::AuthError::MissingSecret => {
                tracing::error!("Token secret not configured");
                ApiError::service_unavailable("Authentication not configured")
            }
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

impl From<crate::services::media::UploadError> for ApiError {
    fn from(err: crate::services::media::UploadError) -> Self {
        tracing::error!("Media upload failed: {}", err);
        ApiError::bad_gateway("Media upload failed")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::bad_request("x").status_code(), 400);
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::forbidden("x").status_code(), 403);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::conflict("x").status_code(), 409);
        assert_eq!(ApiError::internal_server_error("x").status_code(), 500);
        assert_eq!(ApiError::bad_gateway("x").status_code(), 502);
        assert_eq!(ApiError::service_unavailable("x").status_code(), 503);
    }

    #[test]
    fn json_body_carries_original_status() {
        let err = ApiError::forbidden("not the owner");
        let body = err.to_json();
        assert_eq!(body["status_code"], 403);
        assert_eq!(body["message"], "not the owner");
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn missing_secret_is_a_server_side_failure() {
        let err: ApiError = crate::auth::AuthError::MissingSecret.into();
        assert_eq!(err.status_code(), 503);

        let err: ApiError = crate::auth::AuthError::Expired.into();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn conflict_mapping_leaves_other_errors_alone() {
        let err = ApiError::from_sqlx_with_conflict(sqlx::Error::RowNotFound, "dup");
        assert_eq!(err.status_code(), 404);
    }
}
