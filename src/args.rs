use crate::config::types::{CoverageType, PromptType};
use clap::{Args, Parser};
use std::path::PathBuf;

/// Coverage-feedback-driven LLM unit test generation engine.
#[derive(Parser, Debug)]
#[command(name = "pathcov", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// TOML config file layered underneath the CLI flags above
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

#[derive(Args, Debug, Default)]
pub struct LoggingArgs {
    /// tracing-subscriber env-filter directive, e.g. "info" or "pathcov=debug"
    #[arg(long, default_value = "info")]
    pub log_level: String,
    #[arg(long)]
    pub no_color: bool,
    #[arg(short, long)]
    pub quiet: bool,
}

/// One `Option<T>` field per recognized configuration key; `None` means
/// "not set on the CLI, defer to the TOML file or built-in default".
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    #[arg(long)]
    pub project_directory: Option<PathBuf>,
    #[arg(long)]
    pub source_code_file: Option<PathBuf>,
    #[arg(long)]
    pub test_code_file: Option<PathBuf>,
    #[arg(long)]
    pub test_file_output_path: Option<PathBuf>,
    #[arg(long)]
    pub code_coverage_report_path: Option<PathBuf>,
    #[arg(long)]
    pub test_execution_command: Option<String>,
    #[arg(long)]
    pub test_dependency_command: Option<String>,
    #[arg(long)]
    pub test_code_command_dir: Option<PathBuf>,
    #[arg(long)]
    pub included_files: Vec<PathBuf>,
    #[arg(long)]
    pub junit_version: Option<u8>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long, value_enum)]
    pub coverage_type: Option<CoverageType>,
    #[arg(long)]
    pub report_filepath: Option<String>,
    #[arg(long)]
    pub target_coverage: Option<u32>,
    #[arg(long)]
    pub maximum_iterations: Option<u32>,
    #[arg(long)]
    pub no_coverage_increase_iterations: Option<u32>,
    #[arg(long)]
    pub enable_fixing: Option<u32>,
    #[arg(long)]
    pub run_symprompt: Option<bool>,
    #[arg(long, value_enum)]
    pub prompt_type: Option<PromptType>,
    #[arg(long)]
    pub pick_two_paths: Option<bool>,
    #[arg(long)]
    pub additional_instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
