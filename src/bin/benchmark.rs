use roadguard::{
    benchmark::{measure, synthetic_input, warm_up},
    config, setup_logging, OrtModelService,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match config::get_configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Ok(environment) = config::get_environment() {
        setup_logging(&config.log_level, &environment);
    }

    println!("Loading model...");
    let model = match OrtModelService::new(&config.model) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error loading model: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let input = synthetic_input(&mut rand::rng());

    println!("Warming up...");
    if let Err(e) = warm_up(&model, &input, config.benchmark.warmup_runs) {
        eprintln!("Benchmark failed: {}", e);
        return ExitCode::FAILURE;
    }

    println!(
        "Running benchmark ({} iterations)...",
        config.benchmark.iterations
    );
    match measure(&model, &input, config.benchmark.iterations) {
        Ok(report) => {
            tracing::debug!(?report, "Benchmark finished");
            println!("\n{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Benchmark failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
