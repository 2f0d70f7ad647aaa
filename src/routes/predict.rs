use crate::{
    pipeline::{Analysis, AnalysisError},
    routes::error_status,
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::instrument;

const ROUTE: &str = "/api/predict";

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        (
            error_status(&self),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[instrument(skip(state, image_data))]
pub async fn predict(
    State(state): State<SharedState>,
    image_data: Bytes,
) -> Result<Json<Analysis>, AnalysisError> {
    state.metrics.record_request(ROUTE);

    let analysis = state
        .pipeline
        .analyze(image_data.to_vec())
        .await
        .inspect_err(|e| tracing::warn!("Prediction failed: {}", e))?;

    state
        .metrics
        .record_inference_duration(analysis.latency_ms, ROUTE);
    state.metrics.record_decision(analysis.decision.label.as_str());

    Ok(Json(analysis))
}
