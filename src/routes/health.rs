use crate::server::SharedState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Status {
    status: String,
}

pub async fn healthcheck(State(state): State<SharedState>) -> impl IntoResponse {
    match state.pipeline.availability() {
        Ok(_) => (
            StatusCode::OK,
            Json(Status {
                status: "Available".into(),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(Status {
                status: "Unavailable".into(),
            }),
        ),
    }
}
