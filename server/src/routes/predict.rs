//! Image prediction endpoint.

use axum::body::Bytes;
use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct PredictResponse {
    /// Predicted class index
    pub prediction: usize,
    /// Softmax probability of the predicted class, in [0, 1]. A derived
    /// score, not a calibrated probability.
    pub confidence: f32,
}

/// POST /predict - classify one image given as raw bytes in the body.
///
/// 503 when no checkpoint was loadable at startup, 400 for undecodable
/// payloads, 500 for unexpected inference failures. Every failure is
/// isolated to its own request.
pub async fn predict(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let predictor = state
        .predictor
        .as_ref()
        .ok_or(ApiError::Pipeline(visionpipe::Error::ModelUnavailable))?;

    let prediction = predictor.predict(&body)?;

    Ok(Json(PredictResponse {
        prediction: prediction.class_index,
        confidence: prediction.confidence,
    }))
}
