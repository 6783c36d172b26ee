use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bazaar_core::errors::BazaarError;

#[derive(Debug)]
pub struct BazaarAxumError(pub anyhow::Error);

impl From<anyhow::Error> for BazaarAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for BazaarAxumError {
    fn into_response(self) -> Response {
        // Keep the structured fields even when wrapped by anyhow contexts
        if let Some(err) = BazaarError::from_anyhow(&self.0) {
            let safe = err.sanitize_for_client();
            let status = StatusCode::from_u16(safe.code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(safe.to_json())).into_response();
        }

        tracing::error!(error = %self.0, "unstructured error reached the client");
        let err = BazaarError::general_error(self.0.to_string());
        let status = StatusCode::from_u16(err.code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(err.to_json())).into_response()
    }
}
