//! Coverage Parser (C10) and Branch/Coverage Joiner (C4).
//!
//! Coverage backends are expressed as a tagged enum with a single
//! `parse()` method rather than a trait object, per the design notes:
//! there are exactly two backends and neither needs open extension.

pub mod jacoco;
pub mod pycov;

use crate::errors::RunError;
use crate::model::{Coverage, Method, Path};
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub enum CoverageBackend {
    Jacoco { project_dir: PathBuf },
    Pycov { project_dir: PathBuf },
}

impl CoverageBackend {
    pub fn from_name(name: &str, project_dir: PathBuf) -> Result<Self, RunError> {
        match name {
            "jacoco" => Ok(Self::Jacoco { project_dir }),
            "pycov" => Ok(Self::Pycov { project_dir }),
            other => Err(RunError::UnknownBackend(other.to_string())),
        }
    }

    pub fn parse(
        &self,
        report_path: &std::path::Path,
        source_code_file: &std::path::Path,
        test_run_started_at: SystemTime,
    ) -> Result<Coverage, RunError> {
        assert_report_fresh(report_path, test_run_started_at)?;
        match self {
            Self::Jacoco { project_dir } => jacoco::parse(project_dir, report_path, source_code_file),
            Self::Pycov { project_dir } => pycov::parse(project_dir, report_path, source_code_file),
        }
    }
}

fn assert_report_fresh(report_path: &std::path::Path, started_at: SystemTime) -> Result<(), RunError> {
    let meta = std::fs::metadata(report_path).map_err(|_| RunError::StaleCoverage)?;
    let mtime = meta.modified().map_err(|_| RunError::StaleCoverage)?;
    if mtime <= started_at {
        return Err(RunError::StaleCoverage);
    }
    Ok(())
}

/// Branch/Coverage Joiner (C4): for each candidate path, compute the
/// source lines it touches and intersect with `coverage.missed_lines`
/// / `missed_branches` to derive `missed_value`. Only paths with
/// `missed_value > 0` are carriers.
pub fn join_paths_with_coverage(method: &Method, paths: Vec<Path>, line_map: &crate::model::LineMap, coverage: &Coverage) -> Vec<Path> {
    let _ = method;
    paths
        .into_iter()
        .map(|mut path| {
            let lines: std::collections::HashSet<u32> = path
                .node_ids
                .iter()
                .flat_map(|n| line_map.lines_for(*n).iter().copied())
                .collect();
            let missed_lines = lines.iter().filter(|l| coverage.missed_lines.contains(l)).count();
            let missed_branches = lines.iter().filter(|l| coverage.missed_branches.contains(l)).count();
            path.missed_value = missed_lines + missed_branches;
            path
        })
        .filter(|p| p.missed_value > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn unknown_backend_is_a_config_error() {
        let err = CoverageBackend::from_name("cobertura", PathBuf::from(".")).unwrap_err();
        assert!(matches!(err, RunError::UnknownBackend(_)));
    }

    #[test]
    fn join_filters_zero_missed_value_paths() {
        let method = Method {
            entry_id: 0,
            last_return_id: None,
            exit_id: 1,
            nodes: Vec::new(),
            edges: Vec::new(),
            name: "f".into(),
            class_name: "Foo".into(),
            cyclomatic_complexity: 2,
        };
        let mut line_map = crate::model::LineMap::default();
        line_map.node_to_lines.insert(0, vec![5]);
        let mut coverage = Coverage::default();
        coverage.missed_lines = HashSet::from([5]);
        let path_hit = Path::new("f", 0, 0, vec![0], Vec::new());
        let path_miss = Path {
            node_ids: vec![99],
            ..Path::new("f", 0, 1, vec![99], Vec::new())
        };
        let joined = join_paths_with_coverage(&method, vec![path_hit, path_miss], &line_map, &coverage);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].missed_value, 1);
    }
}
