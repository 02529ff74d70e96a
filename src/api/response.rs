use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Wrapper for API responses that adds the uniform success envelope:
/// `{status_code, data, message}`.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with 200 status
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            status_code: StatusCode::OK,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            status_code: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "status_code": 500,
                        "message": "Failed to serialize response data",
                        "code": "INTERNAL_SERVER_ERROR",
                    })),
                )
                    .into_response();
            }
        };

        let envelope = json!({
            "status_code": self.status_code.as_u16(),
            "data": data_value,
            "message": self.message,
        });

        (self.status_code, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_defaults_to_200() {
        let res = ApiResponse::success(json!({"ok": true}), "done");
        assert_eq!(res.status_code, StatusCode::OK);
        assert_eq!(res.message, "done");
    }

    #[test]
    fn created_uses_201() {
        let res = ApiResponse::created(json!(null), "made");
        assert_eq!(res.status_code, StatusCode::CREATED);
    }
}
