pub mod types;

use crate::errors::RunError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
pub use types::{CoverageType, PromptType};

/// Engine configuration. Every field corresponds to one of the
/// recognized flat configuration keys; CLI flags and an optional TOML
/// file are merged into this struct, CLI winning over file winning
/// over built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project_directory: PathBuf,
    pub source_code_file: PathBuf,
    pub test_code_file: PathBuf,
    #[serde(default)]
    pub test_file_output_path: PathBuf,
    pub code_coverage_report_path: PathBuf,
    pub test_execution_command: String,
    #[serde(default)]
    pub test_dependency_command: String,
    pub test_code_command_dir: PathBuf,
    #[serde(default)]
    pub included_files: Vec<PathBuf>,
    pub junit_version: u8,
    pub model: String,
    pub coverage_type: CoverageType,
    pub report_filepath: String,
    pub target_coverage: u32,
    pub maximum_iterations: u32,
    pub no_coverage_increase_iterations: u32,
    pub enable_fixing: u32,
    pub run_symprompt: bool,
    pub prompt_type: PromptType,
    pub pick_two_paths: bool,
    #[serde(default)]
    pub additional_instructions: String,

    #[serde(with = "humantime_serde", default = "default_test_timeout")]
    pub test_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_analysis_timeout")]
    pub analysis_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_path_timeout")]
    pub path_enumeration_timeout: Duration,

    #[serde(default)]
    pub log_level: String,
    #[serde(default)]
    pub color: bool,
    #[serde(default)]
    pub quiet: bool,
}

fn default_test_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_analysis_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_path_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_directory: PathBuf::from("."),
            source_code_file: PathBuf::new(),
            test_code_file: PathBuf::new(),
            test_file_output_path: PathBuf::new(),
            code_coverage_report_path: PathBuf::new(),
            test_execution_command: String::new(),
            test_dependency_command: String::new(),
            test_code_command_dir: PathBuf::from("."),
            included_files: Vec::new(),
            junit_version: 4,
            model: "gpt-4o".to_string(),
            coverage_type: CoverageType::Jacoco,
            report_filepath: "report.json".to_string(),
            target_coverage: 90,
            maximum_iterations: 10,
            no_coverage_increase_iterations: 3,
            enable_fixing: 3,
            run_symprompt: false,
            prompt_type: PromptType::Coverage,
            pick_two_paths: true,
            additional_instructions: String::new(),
            test_timeout: default_test_timeout(),
            analysis_timeout: default_analysis_timeout(),
            path_enumeration_timeout: default_path_timeout(),
            log_level: "info".to_string(),
            color: true,
            quiet: false,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, RunError> {
        let cfg: Config = toml::from_str(s).map_err(|e| RunError::Config(e.to_string()))?;
        Ok(cfg)
    }

    /// Merge CLI-derived overrides on top of `self` (which may have come
    /// from a TOML file or from `Default::default()`). `self` is the
    /// lower-precedence side; `other`'s `Some` fields win.
    pub fn merge_cli(mut self, cli: &crate::args::ConfigArgs) -> Self {
        macro_rules! over {
            ($field:ident) => {
                if let Some(v) = cli.$field.clone() {
                    self.$field = v;
                }
            };
        }
        over!(project_directory);
        over!(source_code_file);
        over!(test_code_file);
        over!(test_file_output_path);
        over!(code_coverage_report_path);
        over!(test_execution_command);
        over!(test_dependency_command);
        over!(test_code_command_dir);
        over!(junit_version);
        over!(model);
        over!(coverage_type);
        over!(report_filepath);
        over!(target_coverage);
        over!(maximum_iterations);
        over!(no_coverage_increase_iterations);
        over!(enable_fixing);
        over!(prompt_type);
        over!(additional_instructions);
        if let Some(v) = cli.run_symprompt {
            self.run_symprompt = v;
        }
        if let Some(v) = cli.pick_two_paths {
            self.pick_two_paths = v;
        }
        if !cli.included_files.is_empty() {
            self.included_files = cli.included_files.clone();
        }
        if self.test_file_output_path.as_os_str().is_empty() {
            self.test_file_output_path = self.test_code_file.clone();
        }
        self
    }

    pub fn validate(&self) -> Result<(), RunError> {
        if self.source_code_file.as_os_str().is_empty() {
            return Err(RunError::Config("source_code_file is required".into()));
        }
        if self.test_execution_command.is_empty() {
            return Err(RunError::Config("test_execution_command is required".into()));
        }
        if !(1..=100).contains(&self.target_coverage) {
            return Err(RunError::Config("target_coverage must be in 1..=100".into()));
        }
        Ok(())
    }

    /// Report label per the teacher's `g_{label}` naming convention:
    /// `{prompt_type}_{model}[_one]`, or `symprompt_{model}` when
    /// `run_symprompt` is set.
    pub fn report_label(&self) -> String {
        if self.run_symprompt {
            format!("symprompt_{}", self.model)
        } else if self.pick_two_paths {
            format!("{}_{}", self.prompt_type, self.model)
        } else {
            format!("{}_{}_one", self.prompt_type, self.model)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_timeouts() {
        let cfg = Config::default();
        assert_eq!(cfg.test_timeout, Duration::from_secs(60));
        assert_eq!(cfg.analysis_timeout, Duration::from_secs(10));
        assert_eq!(cfg.path_enumeration_timeout, Duration::from_secs(5));
    }

    #[test]
    fn report_label_reflects_mode() {
        let mut cfg = Config::default();
        cfg.prompt_type = PromptType::Control;
        cfg.model = "gpt-4o".into();
        cfg.pick_two_paths = true;
        assert_eq!(cfg.report_label(), "control_gpt-4o");
        cfg.pick_two_paths = false;
        assert_eq!(cfg.report_label(), "control_gpt-4o_one");
        cfg.run_symprompt = true;
        assert_eq!(cfg.report_label(), "symprompt_gpt-4o");
    }

    #[test]
    fn validate_rejects_missing_source() {
        let cfg = Config::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_round_trip_uses_defaults_for_missing_keys() {
        let cfg = Config::from_toml_str("source_code_file = \"Foo.java\"\ntest_execution_command = \"mvn test\"\n").unwrap();
        assert_eq!(cfg.target_coverage, 90);
        assert_eq!(cfg.junit_version, 4);
    }
}
