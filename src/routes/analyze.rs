use crate::{
    page::{render_page, PageBody, ACCEPTED_EXTENSIONS},
    pipeline::AnalysisError,
    routes::error_status,
    server::SharedState,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;
use tracing::instrument;

const ROUTE: &str = "/analyze";
const FIELD_NAME: &str = "image";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("No image was uploaded")]
    MissingImage,
    #[error("Unsupported file type '{0}'. Upload a jpg, jpeg or png image.")]
    UnsupportedExtension(String),
}

impl UploadError {
    fn status(&self) -> StatusCode {
        match self {
            UploadError::Multipart(e) => e.status(),
            UploadError::MissingImage => StatusCode::BAD_REQUEST,
            UploadError::UnsupportedExtension(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

pub(crate) fn check_extension(file_name: &str) -> Result<(), UploadError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    if ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(UploadError::UnsupportedExtension(extension))
    }
}

async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }
        if let Some(file_name) = field.file_name() {
            check_extension(file_name)?;
        }
        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(UploadError::MissingImage);
        }
        return Ok(data);
    }

    Err(UploadError::MissingImage)
}

fn error_page(status: StatusCode, message: &str) -> Response {
    (status, Html(render_page(&PageBody::Error { message }))).into_response()
}

#[instrument(skip(state, multipart))]
pub async fn analyze_upload(State(state): State<SharedState>, mut multipart: Multipart) -> Response {
    state.metrics.record_request(ROUTE);

    let image_data = match read_upload(&mut multipart).await {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("Rejected upload: {}", e);
            return error_page(e.status(), &e.to_string());
        }
    };

    if let Some(delay) = state.ui.get_demo_delay() {
        tokio::time::sleep(delay).await;
    }

    match state.pipeline.analyze(image_data.to_vec()).await {
        Ok(analysis) => {
            state
                .metrics
                .record_inference_duration(analysis.latency_ms, ROUTE);
            state.metrics.record_decision(analysis.decision.label.as_str());
            tracing::info!(
                label = analysis.decision.label.as_str(),
                confidence = analysis.decision.confidence,
                "Upload analysed"
            );

            Html(render_page(&PageBody::Result {
                image: &image_data,
                decision: &analysis.decision,
            }))
            .into_response()
        }
        Err(AnalysisError::ModelUnavailable(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(render_page(&PageBody::ModelUnavailable {
                model_file: state.pipeline.model_file(),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Analysis failed: {}", e);
            error_page(error_status(&e), &e.to_string())
        }
    }
}
