use roadguard::{config, setup_logging, start_app};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let environment = config::get_environment()?;
    let config = config::get_configuration()?;
    setup_logging(&config.log_level, &environment);

    start_app(config).await
}
