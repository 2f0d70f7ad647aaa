use crate::{
    config::{ServerConfig, UiConfig},
    pipeline::InferencePipeline,
    routes::api_routes,
    telemetry::Metrics,
};
use axum::{extract::DefaultBodyLimit, Router};
use axum_otel_metrics::HttpMetricsLayerBuilder;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};

#[derive(Clone)]
pub struct SharedState {
    pub pipeline: Arc<InferencePipeline>,
    pub metrics: Arc<Metrics>,
    pub ui: UiConfig,
}

pub fn build_router(state: SharedState, max_upload_bytes: usize) -> Router {
    let metrics_layer = HttpMetricsLayerBuilder::new()
        .with_provider(state.metrics.provider.clone())
        .build();

    Router::new()
        .merge(api_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(metrics_layer)
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(
        pipeline: Arc<InferencePipeline>,
        server_config: &ServerConfig,
        ui_config: &UiConfig,
    ) -> anyhow::Result<Self> {
        let addr = server_config.get_address();

        let app_state = SharedState {
            pipeline,
            metrics: Arc::new(Metrics::new()?),
            ui: ui_config.clone(),
        };
        let router = build_router(app_state, server_config.max_upload_bytes);

        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        mut shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", self.listener.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await.ok();
                })
                .await?;
            Ok(())
        });

        Ok(server_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_utils::{png_bytes, state_with_probability, unavailable_state};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    const BOUNDARY: &str = "roadguard-test-boundary";

    fn multipart_request(file_name: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_upload_pothole() {
        let router = build_router(state_with_probability(0.9), 1024 * 1024);

        let response = router
            .oneshot(multipart_request("road.png", &png_bytes(50, 50)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("POTHOLE DETECTED"));
        assert!(body.contains("Confidence: 90.00%"));
        assert!(body.contains("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_upload_safe() {
        let router = build_router(state_with_probability(0.2), 1024 * 1024);

        let response = router
            .oneshot(multipart_request("road.jpg", &png_bytes(64, 32)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("ROAD IS SAFE"));
        assert!(body.contains("Confidence: 80.00%"));
    }

    #[tokio::test]
    async fn test_upload_rejects_extension() {
        let router = build_router(state_with_probability(0.9), 1024 * 1024);

        let response = router
            .oneshot(multipart_request("road.gif", &png_bytes(10, 10)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_upload_undecodable_image() {
        let router = build_router(state_with_probability(0.9), 1024 * 1024);

        let response = router
            .oneshot(multipart_request("road.png", b"not really a png"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("Error decoding image"));
    }

    #[tokio::test]
    async fn test_upload_without_model() {
        let router = build_router(unavailable_state(), 1024 * 1024);

        let response = router
            .oneshot(multipart_request("road.png", &png_bytes(10, 10)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_text(response).await.contains("not found"));
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let router = build_router(state_with_probability(0.9), 64);

        let response = router
            .oneshot(multipart_request("road.png", &png_bytes(100, 100)))
            .await
            .unwrap();

        assert!(!response.status().is_success());
        assert!(!body_text(response).await.contains("POTHOLE DETECTED"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let router = build_router(state_with_probability(0.9), 1024 * 1024);

        let response = router
            .clone()
            .oneshot(multipart_request("road.png", &png_bytes(20, 20)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("http_server_request_duration"));
        assert!(body.contains("requests_total"));
        assert!(body.contains("decisions_total"));
        assert!(body.contains("label=\"pothole\""));
        assert!(!body.contains("requests_total_total"));
    }
}
