mod analyze;
mod health;
mod index;
mod metrics;
mod predict;

use crate::{pipeline::AnalysisError, server::SharedState};
use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};

pub use analyze::analyze_upload;
pub use health::healthcheck;
pub use index::index;
pub use metrics::metrics_handler;
pub use predict::predict;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze_upload))
        .route("/api/predict", post(predict))
        .route("/health", get(healthcheck))
        .route("/metrics", get(metrics_handler))
}

pub(crate) fn error_status(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        AnalysisError::Inference(_) | AnalysisError::Decision(_) | AnalysisError::Task(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
