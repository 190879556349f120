use crate::errors::RunError;
use crate::model::Attempt;
use std::fmt::Write as _;
use std::path::Path;

pub fn write(attempts: &[Attempt], path: &Path) -> Result<(), RunError> {
    let mut out = String::from("| # | Label | Status | Line % | Branch % | Reason |\n|---|---|---|---|---|---|\n");
    for (i, attempt) in attempts.iter().enumerate() {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.1} | {:.1} | {} |",
            i + 1,
            attempt.label,
            attempt.status,
            attempt.line_pct * 100.0,
            attempt.branch_pct * 100.0,
            attempt.reason.replace('\n', " ")
        );
    }
    std::fs::write(path, out)?;
    Ok(())
}
