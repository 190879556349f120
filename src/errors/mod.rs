use std::fmt::{self, Display, Formatter};

/// Error states that can be returned by the engine.
#[derive(Debug)]
pub enum RunError {
    /// Error in the run configuration (flags, TOML file, unknown model alias...)
    Config(String),
    /// Source file could not be located or read
    Source(String),
    /// Failure launching the test/build command
    TestLaunch(String),
    /// Tests failed to compile
    TestCompile(String),
    /// Test failed during run (assertion/runtime)
    TestRuntime(String),
    /// Test command timed out
    Timeout,
    /// Failed to parse the coverage report
    CovReport(String),
    /// Coverage report missing or not refreshed since test run started
    StaleCoverage,
    /// Unknown coverage backend requested
    UnknownBackend(String),
    /// CFG/path analysis error
    Analysis(String),
    /// Template rendering failure (e.g. missing variable)
    Template(String),
    /// LLM gateway error (network, provider, or malformed contract)
    Gateway(String),
    /// Failed to parse LLM YAML reply even with the tolerant loader
    Yaml(String),
    IO(std::io::Error),
    Json(String),
    Internal(String),
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Invalid configuration: {e}"),
            Self::Source(e) => write!(f, "Failed to read source unit: {e}"),
            Self::TestLaunch(e) => write!(f, "Failed to launch test command: {e}"),
            Self::TestCompile(e) => write!(f, "Failed to compile tests!\n{e}"),
            Self::TestRuntime(e) => write!(f, "Test run failed: {e}"),
            Self::Timeout => write!(f, "Test command timed out"),
            Self::CovReport(e) => write!(f, "Failed to parse coverage report: {e}"),
            Self::StaleCoverage => write!(f, "Coverage report was not refreshed by the test run"),
            Self::UnknownBackend(e) => write!(f, "Unknown coverage backend: {e}"),
            Self::Analysis(e) => write!(f, "CFG/path analysis error: {e}"),
            Self::Template(e) => write!(f, "Template rendering failed: {e}"),
            Self::Gateway(e) => write!(f, "LLM gateway error: {e}"),
            Self::Yaml(e) => write!(f, "Failed to parse LLM reply as YAML: {e}"),
            Self::IO(e) => write!(f, "{e}"),
            Self::Json(e) => write!(f, "Failed to serialize report: {e}"),
            Self::Internal(e) => write!(f, "Internal error: {e}"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        RunError::IO(e)
    }
}

impl From<serde_json::error::Error> for RunError {
    fn from(e: serde_json::error::Error) -> Self {
        RunError::Json(e.to_string())
    }
}

impl From<serde_yaml::Error> for RunError {
    fn from(e: serde_yaml::Error) -> Self {
        RunError::Yaml(e.to_string())
    }
}

impl From<minijinja::Error> for RunError {
    fn from(e: minijinja::Error) -> Self {
        RunError::Template(e.to_string())
    }
}

impl From<reqwest::Error> for RunError {
    fn from(e: reqwest::Error) -> Self {
        RunError::Gateway(e.to_string())
    }
}

impl From<toml::de::Error> for RunError {
    fn from(e: toml::de::Error) -> Self {
        RunError::Config(e.to_string())
    }
}
