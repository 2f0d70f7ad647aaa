//! Inference latency measurement on synthetic input.

use crate::{
    model_service::{ModelError, ModelService},
    preprocessing::{INPUT_CHANNELS, INPUT_SIZE},
};
use ndarray::{Array, Ix4};
use rand::Rng;
use std::{
    fmt,
    time::{Duration, Instant},
};

/// Uniform noise in [0, 1) with the classifier's input shape.
pub fn synthetic_input<R: Rng + ?Sized>(rng: &mut R) -> Array<f32, Ix4> {
    let size = INPUT_SIZE as usize;
    Array::from_shape_simple_fn((1, size, size, INPUT_CHANNELS), || rng.random::<f32>())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatencyReport {
    pub iterations: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl LatencyReport {
    pub fn from_durations(timings: &[Duration]) -> Option<Self> {
        if timings.is_empty() {
            return None;
        }

        let millis: Vec<f64> = timings.iter().map(|d| d.as_secs_f64() * 1000.).collect();
        let mean_ms = millis.iter().sum::<f64>() / millis.len() as f64;
        let min_ms = millis.iter().copied().fold(f64::INFINITY, f64::min);
        let max_ms = millis.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            iterations: millis.len(),
            mean_ms,
            min_ms,
            max_ms,
        })
    }
}

impl fmt::Display for LatencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results:")?;
        writeln!(f, "Average Latency: {:.2} ms", self.mean_ms)?;
        writeln!(f, "Min Latency: {:.2} ms", self.min_ms)?;
        write!(f, "Max Latency: {:.2} ms", self.max_ms)
    }
}

/// Discarded predictions that absorb one-time initialization costs.
pub fn warm_up(
    model: &dyn ModelService,
    input: &Array<f32, Ix4>,
    runs: usize,
) -> Result<(), ModelError> {
    for _ in 0..runs {
        model.predict(input)?;
    }
    Ok(())
}

pub fn measure(
    model: &dyn ModelService,
    input: &Array<f32, Ix4>,
    iterations: usize,
) -> Result<LatencyReport, ModelError> {
    let mut timings = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let start = Instant::now();
        model.predict(input)?;
        timings.push(start.elapsed());
    }

    LatencyReport::from_durations(&timings)
        .ok_or_else(|| ModelError::Inference("benchmark ran zero iterations".into()))
}
