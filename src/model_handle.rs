use crate::{
    config::ModelConfig,
    model_service::{ModelError, ModelService},
    ort_service::OrtModelService,
};
use std::{
    fmt,
    sync::{Arc, OnceLock},
};
use thiserror::Error;

type Loader = Box<dyn Fn() -> Result<Arc<dyn ModelService>, ModelError> + Send + Sync>;

/// Returned when the model artifact could not be loaded. This is a
/// configuration problem: it is cached and never retried.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Model file '{model_file}' could not be loaded: {reason}")]
pub struct ModelUnavailable {
    pub model_file: String,
    pub reason: String,
}

/// Initialize-once owner of the classifier.
///
/// The loader runs at most once for the lifetime of the handle; every later
/// `load()` returns the same instance, or the same unavailability, without
/// touching storage again.
pub struct ModelHandle {
    model_file: String,
    loader: Loader,
    cell: OnceLock<Result<Arc<dyn ModelService>, ModelUnavailable>>,
}

impl ModelHandle {
    pub fn new<F>(model_file: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn ModelService>, ModelError> + Send + Sync + 'static,
    {
        Self {
            model_file: model_file.into(),
            loader: Box::new(loader),
            cell: OnceLock::new(),
        }
    }

    /// Handle backed by ONNX Runtime, reading the configured model file.
    pub fn from_config(model_config: &ModelConfig) -> Self {
        let config = model_config.clone();
        Self::new(model_config.model_file.clone(), move || {
            let service = OrtModelService::new(&config)?;
            Ok(Arc::new(service) as Arc<dyn ModelService>)
        })
    }

    /// Wraps an already constructed model. The cell starts initialized, so
    /// the loader is never called.
    pub fn ready(model_file: impl Into<String>, model: Arc<dyn ModelService>) -> Self {
        let model_file = model_file.into();
        let path = model_file.clone();
        Self {
            model_file,
            loader: Box::new(move || Err(ModelError::NotFound(path.clone()))),
            cell: OnceLock::from(Ok(model)),
        }
    }

    pub fn load(&self) -> Result<Arc<dyn ModelService>, ModelUnavailable> {
        self.cell
            .get_or_init(|| match (self.loader)() {
                Ok(model) => {
                    tracing::info!(model_file = %self.model_file, "Model loaded");
                    Ok(model)
                }
                Err(e) => {
                    tracing::error!(model_file = %self.model_file, error = %e, "Model unavailable");
                    Err(ModelUnavailable {
                        model_file: self.model_file.clone(),
                        reason: e.to_string(),
                    })
                }
            })
            .clone()
    }

    pub fn model_file(&self) -> &str {
        &self.model_file
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            None => "uninitialized",
            Some(Ok(_)) => "available",
            Some(Err(_)) => "unavailable",
        };
        f.debug_struct("ModelHandle")
            .field("model_file", &self.model_file)
            .field("state", &state)
            .finish()
    }
}
