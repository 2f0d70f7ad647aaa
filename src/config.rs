use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub model: ModelConfig,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    #[serde(default = "default_model_file")]
    pub model_file: String,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
    #[serde(default = "default_inference_timeout_ms")]
    pub inference_timeout_ms: u64,
}

fn default_model_file() -> String {
    "pothole_detector_final.onnx".into()
}

fn default_intra_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_inference_timeout_ms() -> u64 {
    5_000
}

impl ModelConfig {
    pub fn get_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn get_inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BenchmarkConfig {
    #[serde(default = "default_warmup_runs")]
    pub warmup_runs: usize,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

fn default_warmup_runs() -> usize {
    5
}

fn default_iterations() -> usize {
    50
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            warmup_runs: default_warmup_runs(),
            iterations: default_iterations(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UiConfig {
    /// Pause before each analysis so the spinner is visible in demos.
    #[serde(default)]
    pub demo_delay_ms: u64,
}

impl UiConfig {
    pub fn get_demo_delay(&self) -> Option<Duration> {
        (self.demo_delay_ms > 0).then(|| Duration::from_millis(self.demo_delay_ms))
    }
}

pub trait Validatable {
    fn validate(&self) -> Result<(), String>;
}

impl Validatable for BenchmarkConfig {
    fn validate(&self) -> Result<(), String> {
        if self.iterations == 0 {
            return Err("benchmark.iterations must be greater than zero".into());
        }
        Ok(())
    }
}

impl Validatable for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_upload_bytes == 0 {
            return Err("server.max_upload_bytes must be greater than zero".into());
        }
        Ok(())
    }
}

// The model file is not checked here: a missing artifact is reported by the
// model handle as an unavailable model, not as a startup failure.
impl Validatable for Config {
    fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.benchmark.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

pub fn get_environment() -> Result<Environment, config::ConfigError> {
    std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");
    let environment = get_environment()?;

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("ROADGUARD")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;
    config.validate().map_err(config::ConfigError::Message)?;

    Ok(config)
}
