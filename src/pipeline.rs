use crate::{
    decision::{decide, Decision, DecisionError},
    model_handle::{ModelHandle, ModelUnavailable},
    model_service::{ModelError, ModelService},
    preprocessing::{preprocess_bytes, PreprocessError},
};
use serde::Serialize;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{0}")]
    ModelUnavailable(#[from] ModelUnavailable),
    #[error("{0}")]
    Decode(#[from] PreprocessError),
    #[error("Analysis Failed: {0}")]
    Inference(#[from] ModelError),
    #[error("Analysis Failed: inference did not finish within {0:?}")]
    Timeout(Duration),
    #[error("Analysis Failed: {0}")]
    Decision(#[from] DecisionError),
    #[error("Analysis Failed: inference task aborted: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub probability: f32,
    #[serde(flatten)]
    pub decision: Decision,
    pub width: u32,
    pub height: u32,
    pub latency_ms: f64,
}

/// Image bytes in, labelled decision out.
#[derive(Debug)]
pub struct InferencePipeline {
    model_handle: ModelHandle,
    inference_timeout: Duration,
}

impl InferencePipeline {
    pub fn new(model_handle: ModelHandle, inference_timeout: Duration) -> Self {
        Self {
            model_handle,
            inference_timeout,
        }
    }

    pub fn availability(&self) -> Result<Arc<dyn ModelService>, ModelUnavailable> {
        self.model_handle.load()
    }

    pub fn model_file(&self) -> &str {
        self.model_handle.model_file()
    }

    #[instrument(skip(self, image_data), fields(bytes = image_data.len()))]
    pub async fn analyze(&self, image_data: Vec<u8>) -> Result<Analysis, AnalysisError> {
        let model = self.availability()?;
        let (input, width, height) =
            tokio::task::spawn_blocking(move || preprocess_bytes(&image_data))
                .await
                .map_err(|e| AnalysisError::Task(e.to_string()))??;

        let started = Instant::now();
        let task = tokio::task::spawn_blocking(move || model.predict(&input));
        let probability = match tokio::time::timeout(self.inference_timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => return Err(AnalysisError::Task(join_error.to_string())),
            Err(_) => return Err(AnalysisError::Timeout(self.inference_timeout)),
        };
        let latency_ms = started.elapsed().as_secs_f64() * 1000.;

        let decision = decide(probability)?;
        tracing::debug!(
            probability,
            label = decision.label.as_str(),
            confidence = decision.confidence,
            latency_ms,
            "Image analysed"
        );

        Ok(Analysis {
            probability,
            decision,
            width,
            height,
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Label;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use ndarray::{Array, Ix4};
    use std::{
        io::Cursor,
        sync::atomic::{AtomicUsize, Ordering},
    };

    struct MockModelService {
        probability: f32,
        calls: Arc<AtomicUsize>,
    }

    impl ModelService for MockModelService {
        fn predict(&self, input: &Array<f32, Ix4>) -> Result<f32, ModelError> {
            assert_eq!(input.shape(), &[1, 224, 224, 3]);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.probability)
        }
    }

    struct FailingModelService;

    impl ModelService for FailingModelService {
        fn predict(&self, _input: &Array<f32, Ix4>) -> Result<f32, ModelError> {
            Err(ModelError::Inference("tensor shape mismatch".into()))
        }
    }

    struct SlowModelService;

    impl ModelService for SlowModelService {
        fn predict(&self, _input: &Array<f32, Ix4>) -> Result<f32, ModelError> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(0.9)
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::new(width, height);
        let mut image_data = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut image_data), image::ImageFormat::Png)
            .unwrap();
        image_data
    }

    fn pipeline_with(model: Arc<dyn ModelService>) -> InferencePipeline {
        InferencePipeline::new(ModelHandle::ready("stub.onnx", model), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_analyze_pothole() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = pipeline_with(Arc::new(MockModelService {
            probability: 0.9,
            calls: calls.clone(),
        }));

        let analysis = pipeline.analyze(png_bytes(50, 50)).await.unwrap();

        assert_eq!(analysis.decision.label, Label::Pothole);
        assert!((analysis.decision.confidence - 90.0).abs() < 1e-4);
        assert_eq!((analysis.width, analysis.height), (50, 50));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unavailable_model_never_predicts() {
        let pipeline = InferencePipeline::new(
            ModelHandle::new("pothole_detector_final.onnx", || {
                Err(ModelError::NotFound("models/pothole_detector_final.onnx".into()))
            }),
            Duration::from_secs(5),
        );

        let result = pipeline.analyze(png_bytes(10, 10)).await;

        assert!(matches!(result, Err(AnalysisError::ModelUnavailable(_))));
    }

    #[tokio::test]
    async fn test_decode_error_leaves_pipeline_usable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = pipeline_with(Arc::new(MockModelService {
            probability: 0.2,
            calls: calls.clone(),
        }));

        let result = pipeline.analyze(b"not an image".to_vec()).await;
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let analysis = pipeline.analyze(png_bytes(20, 30)).await.unwrap();
        assert_eq!(analysis.decision.label, Label::Safe);
    }

    #[tokio::test]
    async fn test_inference_error_is_reported() {
        let pipeline = pipeline_with(Arc::new(FailingModelService));

        let err = pipeline.analyze(png_bytes(10, 10)).await.unwrap_err();

        assert!(matches!(err, AnalysisError::Inference(_)));
        assert!(err.to_string().starts_with("Analysis Failed:"));
    }

    #[tokio::test]
    async fn test_out_of_range_probability_is_rejected() {
        let pipeline = pipeline_with(Arc::new(MockModelService {
            probability: 1.5,
            calls: Arc::new(AtomicUsize::new(0)),
        }));

        let err = pipeline.analyze(png_bytes(10, 10)).await.unwrap_err();

        assert!(matches!(err, AnalysisError::Decision(_)));
    }

    #[tokio::test]
    async fn test_large_upload_is_analysed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = pipeline_with(Arc::new(MockModelService {
            probability: 0.6,
            calls: calls.clone(),
        }));

        let analysis = pipeline.analyze(png_bytes(1600, 1200)).await.unwrap();

        assert_eq!((analysis.width, analysis.height), (1600, 1200));
        assert_eq!(analysis.decision.label, Label::Pothole);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_inference_times_out() {
        let pipeline = InferencePipeline::new(
            ModelHandle::ready("stub.onnx", Arc::new(SlowModelService)),
            Duration::from_millis(20),
        );

        let err = pipeline.analyze(png_bytes(10, 10)).await.unwrap_err();

        assert!(matches!(err, AnalysisError::Timeout(_)));
    }
}
