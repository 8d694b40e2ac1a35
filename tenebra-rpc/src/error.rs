use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tenebra_core::TenebraError;
use tracing::error;

/// Adapter from the domain error taxonomy onto HTTP. Internal faults are
/// logged here and surfaced as an opaque `server_error`.
pub struct ApiError(pub TenebraError);

impl From<TenebraError> for ApiError {
    fn from(err: TenebraError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = err.http_status();
        if status >= 500 {
            error!("request failed: {err}");
        }
        let mut body = json!({
            "ok": false,
            "error": err.error_string(),
        });
        if status < 500 {
            body["message"] = json!(err.to_string());
        }
        if let Some(parameter) = err.parameter() {
            body["parameter"] = json!(parameter);
        }
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

pub type ApiResult = Result<Json<serde_json::Value>, ApiError>;
