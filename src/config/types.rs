use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageType {
    Jacoco,
    Pycov,
}

impl Default for CoverageType {
    fn default() -> Self {
        Self::Jacoco
    }
}

impl std::fmt::Display for CoverageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Jacoco => "jacoco",
            Self::Pycov => "pycov",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    Baseline,
    Coverage,
    Control,
    Symprompt,
}

impl Default for PromptType {
    fn default() -> Self {
        Self::Coverage
    }
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Baseline => "baseline",
            Self::Coverage => "coverage",
            Self::Control => "control",
            Self::Symprompt => "symprompt",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_type_displays_lowercase_name() {
        assert_eq!(CoverageType::Jacoco.to_string(), "jacoco");
        assert_eq!(CoverageType::Pycov.to_string(), "pycov");
    }
}
