use ndarray::{Array, Ix4};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to load model from {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: ort::Error,
    },
    #[error("Model file not found: {0}")]
    NotFound(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Unexpected model output: {0}")]
    Output(String),
}

/// A binary classifier taking a preprocessed (1, 224, 224, 3) tensor and
/// returning the sigmoid probability of the positive class.
pub trait ModelService: Send + Sync + 'static {
    fn predict(&self, input: &Array<f32, Ix4>) -> Result<f32, ModelError>;
}
