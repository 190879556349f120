//! Jacoco-style coverage backend.
//!
//! Grounded on the upstream tool's CSV + per-class HTML parsing: the
//! CSV carries per-class totals, the companion HTML page carries the
//! exact missed line/branch numbers via `<span>` CSS classes.

use crate::errors::RunError;
use crate::model::Coverage;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub fn parse(project_dir: &Path, report_path: &Path, source_code_file: &Path) -> Result<Coverage, RunError> {
    let package = extract_package(source_code_file)?;
    let class_name = class_name_of(source_code_file);

    let (line_pct, branch_pct) = parse_csv_totals(report_path, &package, &class_name)?;

    let html_path = per_class_html_path(project_dir, &package, &class_name);
    let (missed_lines, missed_branches) = if html_path.exists() {
        parse_html_missed(&html_path)?
    } else {
        (HashSet::new(), HashSet::new())
    };

    Ok(Coverage {
        missed_lines,
        missed_branches,
        line_pct,
        branch_pct,
    })
}

fn extract_package(source_code_file: &Path) -> Result<String, RunError> {
    let text = std::fs::read_to_string(source_code_file)?;
    let re = Regex::new(r"^\s*package\s+([\w.]+)\s*;").unwrap();
    for line in text.lines() {
        if let Some(caps) = re.captures(line) {
            return Ok(caps[1].to_string());
        }
    }
    Ok(String::new())
}

fn class_name_of(source_code_file: &Path) -> String {
    source_code_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string()
}

fn parse_csv_totals(report_path: &Path, package: &str, class_name: &str) -> Result<(f64, f64), RunError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(report_path)
        .map_err(|e| RunError::CovReport(e.to_string()))?;

    for record in reader.deserialize::<CsvRow>() {
        let row = record.map_err(|e| RunError::CovReport(e.to_string()))?;
        if row.package == package && row.class == class_name {
            let line_pct = Coverage::ratio(row.line_missed, row.line_covered);
            let branch_pct = Coverage::ratio(row.branch_missed, row.branch_covered);
            return Ok((line_pct, branch_pct));
        }
    }
    Err(RunError::CovReport(format!(
        "no row for package={package} class={class_name} in {}",
        report_path.display()
    )))
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "PACKAGE")]
    package: String,
    #[serde(rename = "CLASS")]
    class: String,
    #[serde(rename = "LINE_MISSED")]
    line_missed: usize,
    #[serde(rename = "LINE_COVERED")]
    line_covered: usize,
    #[serde(rename = "BRANCH_MISSED")]
    branch_missed: usize,
    #[serde(rename = "BRANCH_COVERED")]
    branch_covered: usize,
}

fn per_class_html_path(project_dir: &Path, package: &str, class_name: &str) -> PathBuf {
    project_dir
        .join("target")
        .join("jacoco")
        .join(package)
        .join(format!("{class_name}.java.html"))
}

fn parse_html_missed(html_path: &Path) -> Result<(HashSet<u32>, HashSet<u32>), RunError> {
    let text = std::fs::read_to_string(html_path)?;
    let doc = Html::parse_document(&text);
    let selector = Selector::parse("span[id][class]").unwrap();

    let mut missed_lines = HashSet::new();
    let mut missed_branches = HashSet::new();

    for el in doc.select(&selector) {
        let Some(id) = el.value().attr("id") else {
            continue;
        };
        let Some(line) = id.strip_prefix('L').and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        let classes: HashSet<&str> = el.value().classes().collect();
        if classes.contains("nc") || classes.contains("pc") {
            missed_lines.insert(line);
        }
        if classes.contains("bnc") || classes.contains("bpc") {
            missed_branches.insert(line);
        }
    }

    Ok((missed_lines, missed_branches))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_package_declaration() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Foo.java");
        std::fs::write(&file, "package com.example.app;\n\npublic class Foo {}\n").unwrap();
        assert_eq!(extract_package(&file).unwrap(), "com.example.app");
    }

    #[test]
    fn csv_totals_match_matching_row() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("jacoco.csv");
        std::fs::write(
            &csv_path,
            "GROUP,PACKAGE,CLASS,LINE_MISSED,LINE_COVERED,BRANCH_MISSED,BRANCH_COVERED\n\
             proj,com.example,Foo,2,8,1,3\n",
        )
        .unwrap();
        let (line_pct, branch_pct) = parse_csv_totals(&csv_path, "com.example", "Foo").unwrap();
        assert!((line_pct - 0.8).abs() < 1e-9);
        assert!((branch_pct - 0.75).abs() < 1e-9);
    }

    #[test]
    fn html_missed_spans_are_classified() {
        let dir = tempfile::tempdir().unwrap();
        let html_path = dir.path().join("Foo.java.html");
        std::fs::write(
            &html_path,
            r#"<html><body>
            <span class="nc" id="L3">if (x) {</span>
            <span class="pc bpc" id="L4">doThing();</span>
            <span class="fc" id="L5">return;</span>
            </body></html>"#,
        )
        .unwrap();
        let (lines, branches) = parse_html_missed(&html_path).unwrap();
        assert!(lines.contains(&3));
        assert!(lines.contains(&4));
        assert!(branches.contains(&4));
        assert!(!lines.contains(&5));
    }
}
