mod logging;
mod ort_service;
mod page;
mod routes;
mod telemetry;

pub mod app;
pub mod benchmark;
pub mod config;
pub mod decision;
pub mod model_handle;
pub mod model_service;
pub mod pipeline;
pub mod preprocessing;
pub mod server;

pub use app::start_app;
pub use logging::setup_logging;
pub use ort_service::OrtModelService;
