//! HTTP error mapping.
//!
//! Per-request failures map to distinct status codes so a client can tell an
//! unavailable model (503) apart from its own malformed payload (400) and
//! from a genuine inference fault (500). Provider failures on the
//! text-generation path keep their own codes and are never folded into a
//! success body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::llm::ProviderError;

/// Error type returned by request handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Failure from the model pipeline (prediction path)
    Pipeline(visionpipe::Error),
    /// Failure from the text-generation provider
    Provider(ProviderError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Pipeline(err) => match &err {
                visionpipe::Error::ModelUnavailable
                | visionpipe::Error::CheckpointNotFound(_)
                | visionpipe::Error::CheckpointMismatch(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "model_unavailable", err.to_string())
                }
                visionpipe::Error::ImageDecode(_) => {
                    (StatusCode::BAD_REQUEST, "image_decode_error", err.to_string())
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "inference_error", err.to_string()),
            },
            ApiError::Provider(err) => match &err {
                ProviderError::Unavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "provider_unavailable", err.to_string())
                }
                ProviderError::RequestFailed { .. } => {
                    (StatusCode::BAD_GATEWAY, "provider_request_failed", err.to_string())
                }
            },
        };

        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}

impl From<visionpipe::Error> for ApiError {
    fn from(err: visionpipe::Error) -> Self {
        ApiError::Pipeline(err)
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::Provider(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_model_unavailable_is_503() {
        assert_eq!(
            status_of(ApiError::Pipeline(visionpipe::Error::ModelUnavailable)),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_image_decode_is_400() {
        assert_eq!(
            status_of(ApiError::Pipeline(visionpipe::Error::ImageDecode(
                "bad payload".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_inference_error_is_500() {
        assert_eq!(
            status_of(ApiError::Pipeline(visionpipe::Error::Inference(
                "forward pass failed".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_provider_statuses() {
        assert_eq!(
            status_of(ApiError::Provider(ProviderError::Unavailable(
                "no key".to_string()
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ApiError::Provider(ProviderError::RequestFailed {
                status: 429,
                message: "rate limited".to_string()
            })),
            StatusCode::BAD_GATEWAY
        );
    }
}
