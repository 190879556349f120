//! Coverage-feedback-driven JUnit test generation engine.
//!
//! Pipeline: parse the class under test into method-local CFGs,
//! enumerate and select execution paths guided by live coverage,
//! render a strict prompt, call an LLM, integrate and validate the
//! returned tests, repair failures, and repeat until the configured
//! stop condition fires.

pub mod args;
pub mod cfg;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod coverage;
pub mod errors;
pub mod integrator;
pub mod llm;
pub mod model;
pub mod prompt;
pub mod repair;
pub mod report;
pub mod runner;
pub mod selector;

use config::Config;
use errors::RunError;
use llm::HttpGateway;
use std::time::Duration;

/// Builds a `tracing-subscriber` registry from the merged logging
/// flags: `quiet` suppresses everything but warnings, otherwise the
/// configured level filter applies, with ANSI color gated by `color`.
pub fn setup_logging(log_level: &str, color: bool, quiet: bool) {
    let level = if quiet { "warn" } else { log_level };
    let filter = tracing_subscriber::EnvFilter::try_new(level).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(color).try_init();
}

/// Top-level entry point: validates configuration, builds an HTTP LLM
/// gateway from `model`, and drives the Iteration Controller (or the
/// non-iterative symprompt path) to completion.
pub fn run(config: &Config) -> Result<(), RunError> {
    config.validate()?;

    let endpoint = std::env::var("PATHCOV_LLM_ENDPOINT").unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string());
    let api_key = std::env::var("PATHCOV_LLM_API_KEY").unwrap_or_default();
    let gateway = HttpGateway::new(endpoint, api_key, &config.model, Duration::from_secs(120))?;

    let controller = controller::Controller::new(config, &gateway);
    controller.run()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_rejects_invalid_configuration_before_building_a_gateway() {
        let config = Config::default();
        let err = run(&config).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }
}
