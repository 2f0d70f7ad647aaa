use crate::{
    page::{render_page, PageBody},
    server::SharedState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;

#[instrument(skip(state))]
pub async fn index(State(state): State<SharedState>) -> Response {
    state.metrics.record_request("/");

    match state.pipeline.availability() {
        Ok(_) => Html(render_page(&PageBody::Upload)).into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(render_page(&PageBody::ModelUnavailable {
                model_file: state.pipeline.model_file(),
            })),
        )
            .into_response(),
    }
}
