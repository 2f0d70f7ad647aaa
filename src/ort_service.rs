use crate::{
    config::ModelConfig,
    model_service::{ModelError, ModelService},
};
use ndarray::{Array, Ix4};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use parking_lot::Mutex;

pub struct OrtModelService {
    session: Mutex<Session>,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ModelError> {
        let path = model_config.get_path();
        let display_path = path.display().to_string();
        if !path.exists() {
            return Err(ModelError::NotFound(display_path));
        }

        let session = Self::build_session(&path, model_config.intra_threads).map_err(|source| {
            ModelError::Load {
                path: display_path.clone(),
                source,
            }
        })?;

        tracing::info!(path = %display_path, "Created ONNX session");

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    fn build_session(path: &std::path::Path, intra_threads: usize) -> Result<Session, ort::Error> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(path)?;

        Ok(session)
    }

    pub fn run_inference(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, ModelError> {
        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().to_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| ModelError::Inference(format!("failed to build tensor: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Output(format!("failed to extract tensor: {}", e)))?;

        Ok(data.to_vec())
    }
}

impl ModelService for OrtModelService {
    fn predict(&self, input: &Array<f32, Ix4>) -> Result<f32, ModelError> {
        let outputs = self.run_inference(input)?;
        first_probability(&outputs)
    }
}

/// The classifier ends in a single sigmoid unit, so the first value of the
/// (1, 1) output is the pothole probability.
fn first_probability(outputs: &[f32]) -> Result<f32, ModelError> {
    let probability = outputs
        .first()
        .copied()
        .ok_or_else(|| ModelError::Output("empty output tensor".into()))?;

    if !(0.0..=1.0).contains(&probability) {
        return Err(ModelError::Output(format!(
            "probability {} is outside [0, 1]",
            probability
        )));
    }

    Ok(probability)
}
