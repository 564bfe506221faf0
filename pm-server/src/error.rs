//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"detail": "..."}` with a status
//! derived from the `PmError` kind.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{error, warn};

use pm_core::error::PmError;

/// An error response: status plus human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// 404 for a missing row, e.g. `"Tenant not found"`.
    pub fn not_found(entity: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{entity} not found"))
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }
}

impl From<PmError> for ApiError {
    fn from(e: PmError) -> Self {
        let status = match &e {
            PmError::NotFound { .. } => StatusCode::NOT_FOUND,
            PmError::Constraint(_) | PmError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PmError::Llm { .. }
            | PmError::Http(_)
            | PmError::Timeout(_)
            | PmError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("request failed: {e}");
        } else {
            warn!("request rejected: {e}");
        }
        Self::new(status, e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `Json<T>` whose rejections use the `{"detail"}` error shape.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PmError::NotFound { entity: "Property", id: 9 }, StatusCode::NOT_FOUND),
            (PmError::Constraint("UNIQUE constraint failed".into()), StatusCode::BAD_REQUEST),
            (PmError::Llm { status: 500, message: "down".into() }, StatusCode::BAD_GATEWAY),
            (PmError::Timeout("slow".into()), StatusCode::BAD_GATEWAY),
            (PmError::Database("locked".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_not_found_detail() {
        let err = ApiError::from(PmError::NotFound { entity: "Property", id: 9999 });
        assert_eq!(err.detail, "Property with ID 9999 not found");
        assert_eq!(ApiError::not_found("Tenant").detail, "Tenant not found");
    }
}
