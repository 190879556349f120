//! Report Sink (C14): accumulates `Attempt` records for a run and
//! renders them through two backends, following the teacher's
//! convention of one `Report` entry point fronting multiple renderers
//! (e.g. its own Cobertura/lcov/JSON report writers).

mod json;
mod markdown;

use crate::errors::RunError;
use crate::model::Attempt;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct Report {
    attempts: Vec<Attempt>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, attempt: Attempt) {
        self.attempts.push(attempt);
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// `report_filepath` is rewritten into `<parent>/<report_label>/<filename>`
    /// and its markdown sibling shares the same stem.
    pub fn write(&self, report_filepath: &Path, report_label: &str) -> Result<(), RunError> {
        let (json_path, markdown_path) = labeled_paths(report_filepath, report_label);
        if let Some(dir) = json_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        json::write(&self.attempts, &json_path)?;
        markdown::write(&self.attempts, &markdown_path)?;
        Ok(())
    }
}

fn labeled_paths(report_filepath: &Path, report_label: &str) -> (PathBuf, PathBuf) {
    let parent = report_filepath.parent().unwrap_or_else(|| Path::new("."));
    let file_name = report_filepath.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("report.json"));
    let dir = parent.join(report_label);
    let json_path = dir.join(&file_name);
    let markdown_path = json_path.with_extension("md");
    (json_path, markdown_path)
}
