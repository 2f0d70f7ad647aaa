use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::collections::HashSet;

pub struct Metrics {
    request_counter: Counter<u64>,
    decision_counter: Counter<u64>,
    inference_duration: Histogram<f64>,
    pub provider: SdkMeterProvider,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = SdkMeterProvider::builder().with_reader(exporter).build();

        let meter = provider.meter("roadguard");
        global::set_meter_provider(provider.clone());

        let request_counter = meter
            .u64_counter("requests")
            .with_description("Total number of requests")
            .build();

        let decision_counter = meter
            .u64_counter("decisions")
            .with_description("Classification outcomes by label")
            .build();

        let boundaries = generate_boundaries((5, 25, 50, 250, 1000));

        let inference_duration = meter
            .f64_histogram("inference_duration_ms")
            .with_boundaries(boundaries)
            .with_description("Duration of model inference in milliseconds")
            .build();

        Ok(Metrics {
            request_counter,
            decision_counter,
            inference_duration,
            provider,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.request_counter.add(1, &attributes);
    }

    pub fn record_decision(&self, label: &str) {
        let attributes = vec![KeyValue::new("label", label.to_string())];
        self.decision_counter.add(1, &attributes);
    }

    pub fn record_inference_duration(&self, duration_ms: f64, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.inference_duration.record(duration_ms, &attributes);
    }
}

fn generate_boundaries(parts: (i32, i32, i32, i32, i32)) -> Vec<f64> {
    let first_step: usize = 5;
    let middle_step: usize = 5;
    let end_step: usize = 50;
    let tail_step: usize = 250;
    let first_part = (parts.0..=parts.1).step_by(first_step);
    let middle_part = (parts.1..=parts.2).step_by(middle_step);
    let end_part = (parts.2..=parts.3).step_by(end_step);
    let tail_part = (parts.3..=parts.4).step_by(tail_step);

    let mut seen = HashSet::new();
    first_part
        .chain(middle_part)
        .chain(end_part)
        .chain(tail_part)
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}
