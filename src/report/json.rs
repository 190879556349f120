use crate::errors::RunError;
use crate::model::Attempt;
use std::path::Path;

pub fn write(attempts: &[Attempt], path: &Path) -> Result<(), RunError> {
    let body = serde_json::to_string_pretty(attempts)?;
    std::fs::write(path, body)?;
    Ok(())
}
