use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Errors surfaced by the HTTP API.
///
/// Every variant renders as `{"error": "<message>"}` with the status code
/// returned by [`ApiError::status`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("numberOfIds ({requested}) exceeds the per-request limit of {max}")]
    TooManyIds { requested: i64, max: i64 },

    #[error("no issuer became free within {0:?}")]
    Busy(core::time::Duration),

    #[error("service is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Generate(uidgen::Error),

    #[error("generation task failed: {0}")]
    TaskFailed(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::TooManyIds { .. } => StatusCode::BAD_REQUEST,
            Self::Busy(_) | Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            Self::Generate(_) | Self::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<uidgen::Error> for ApiError {
    fn from(err: uidgen::Error) -> Self {
        match err {
            uidgen::Error::AcquireTimeout(timeout) => Self::Busy(timeout),
            uidgen::Error::PoolDisconnected => Self::ShuttingDown,
            other => Self::Generate(other),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    #[test]
    fn maps_library_errors_to_statuses() {
        let regression: ApiError = uidgen::Error::ClockRegression { now: 1, last: 2 }.into();
        assert_eq!(regression.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let busy: ApiError = uidgen::Error::AcquireTimeout(Duration::from_millis(5)).into();
        assert!(matches!(busy, ApiError::Busy(_)));
        assert_eq!(busy.status(), StatusCode::SERVICE_UNAVAILABLE);

        let closed: ApiError = uidgen::Error::PoolDisconnected.into();
        assert_eq!(closed.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn oversized_batches_are_client_errors() {
        let err = ApiError::TooManyIds {
            requested: 10,
            max: 5,
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "numberOfIds (10) exceeds the per-request limit of 5"
        );
    }

    #[test]
    fn regression_message_is_passed_through() {
        let err: ApiError = uidgen::Error::ClockRegression { now: 1, last: 2 }.into();
        assert_eq!(
            err.to_string(),
            uidgen::Error::ClockRegression { now: 1, last: 2 }.to_string()
        );
    }
}
