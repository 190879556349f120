//! Python-coverage-style backend. Placeholder, per the design: it
//! must surface the same four outputs (`missed_lines`,
//! `missed_branches`, `line_pct`, `branch_pct`) as the Jacoco backend
//! so the rest of the pipeline is backend-agnostic, but this crate's
//! supported target language is Java/JUnit and this backend is not
//! wired to a real `coverage.py` report reader.

use crate::errors::RunError;
use crate::model::Coverage;
use std::path::Path;

pub fn parse(_project_dir: &Path, _report_path: &Path, _source_code_file: &Path) -> Result<Coverage, RunError> {
    Err(RunError::UnknownBackend(
        "pycov backend is a placeholder; no coverage.py reader is wired up".to_string(),
    ))
}
