use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogLevel};
use crate::moogsoft::{DynMetricsExporter, RestMetricsExporter};
use crate::process::InvocationReport;

pub mod config;
pub mod events;
pub mod moogsoft;
pub mod process;
pub mod source;
pub mod tags;
pub mod transform;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub fn set_up_logging() {
    // LOGGING_LEVEL is read directly here because logging has to be live
    // before configuration validation runs; unknown values fall back to INFO.
    // RUST_LOG still overrides the default directive.
    let level = env::var("LOGGING_LEVEL")
        .ok()
        .and_then(|v| v.parse::<LogLevel>().ok())
        .unwrap_or(LogLevel::Info);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from(level).into())
                .from_env_lossy(),
        )
        .init();
}

pub fn set_up_moogsoft_exporter(config: &Config) -> Result<DynMetricsExporter, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION"),
        )),
    );

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .pool_max_idle_per_host(10)
        .build()?;

    let exporter = Arc::new(RestMetricsExporter::new(
        client,
        config.api_endpoint.clone(),
        config.api_token.clone(),
    ));

    Ok(exporter)
}

// function entry point: one raw JSON metrics payload per invocation
pub async fn function_handler(
    exporter: DynMetricsExporter,
    config: &Config,
    payload: &[u8],
) -> Result<InvocationReport, Error> {
    match process::metrics(exporter, config, payload).await {
        Ok(report) => Ok(report),
        Err(err) => {
            error!("error handling metrics payload: {}", err);
            Err(err)
        }
    }
}
