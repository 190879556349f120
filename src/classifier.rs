//! Error Classifier (C11): turns a finished (or timed-out) test-run
//! attempt into an `AttemptStatus` plus a trimmed, human-readable
//! reason string.
//!
//! Grounded on the upstream `error_message_parser.py`: classification
//! is priority-ordered (compile failure beats a timeout, a timeout
//! beats a plain runtime/assertion failure), ANSI is stripped before
//! any pattern match runs, and each extracted snippet is capped so it
//! does not blow out the next prompt's context budget.

use crate::model::AttemptStatus;
use regex::Regex;

const MAX_DISPLAY_LINES: usize = 50;

pub struct Classification {
    pub status: AttemptStatus,
    pub reason: String,
}

pub fn strip_ansi(text: &str) -> String {
    let re = Regex::new(r"\x1B\[[0-?]*[ -/]*[@-~]").unwrap();
    re.replace_all(text, "").to_string()
}

fn truncate_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        return text.to_string();
    }
    let tail = &lines[lines.len() - max_lines..];
    format!("...\n{}", tail.join("\n"))
}

/// `COMPILATION ERROR :` blocks from a Maven build, falling back to
/// bare `[ERROR]` lines.
pub fn extract_compilation_error(fail_message: &str) -> String {
    let text = strip_ansi(fail_message);
    let block_re = Regex::new(r"(?s)COMPILATION ERROR\s*:\s*\[INFO\]\s*-+\s*(.*?)\[INFO\] \d+ error").unwrap();
    if let Some(caps) = block_re.captures(&text) {
        return truncate_lines(caps[1].trim(), MAX_DISPLAY_LINES);
    }
    let line_re = Regex::new(r"(?m)^\[ERROR\].*$").unwrap();
    let lines: Vec<&str> = line_re.find_iter(&text).map(|m| m.as_str()).collect();
    if !lines.is_empty() {
        return truncate_lines(&lines.join("\n"), MAX_DISPLAY_LINES);
    }
    "Compilation error".to_string()
}

/// Surefire/Failsafe `<<< FAILURE!` blocks, falling back to bare
/// `FAILED` lines, falling back to a generic marker.
pub fn extract_runtime_error(fail_message: &str) -> String {
    let text = strip_ansi(fail_message);
    let block_re = Regex::new(r"(?s)<<< FAILURE!([\s\S]+?)(?:\n{2}|\z)").unwrap();
    let blocks: Vec<String> = block_re.captures_iter(&text).map(|c| c[1].to_string()).collect();
    if !blocks.is_empty() {
        return truncate_lines(&blocks.join("\n"), MAX_DISPLAY_LINES);
    }
    let failed_re = Regex::new(r"(?m)^.*FAILED\n(?:.+)$").unwrap();
    let matches: Vec<&str> = failed_re.find_iter(&text).map(|m| m.as_str()).collect();
    if !matches.is_empty() {
        return truncate_lines(&matches.join("\n"), MAX_DISPLAY_LINES);
    }
    "Test failures".to_string()
}

/// Priority order: a non-zero exit with compiler diagnostics in the
/// output is a compile failure even if some tests otherwise ran; a
/// timeout that produced no compiler diagnostics is reported as a
/// timeout; anything else non-zero is a runtime/assertion failure.
pub fn classify(exit_code: i32, stdout: &str, stderr: &str, timed_out: bool) -> Classification {
    let combined = format!("{stdout}\n{stderr}");
    let looks_like_compile_failure = combined.contains("COMPILATION ERROR") || combined.contains("[ERROR]");

    if looks_like_compile_failure {
        return Classification {
            status: AttemptStatus::Fail,
            reason: extract_compilation_error(&combined),
        };
    }
    if timed_out {
        return Classification {
            status: AttemptStatus::Fail,
            reason: "Timeout".to_string(),
        };
    }
    if exit_code == 0 {
        return Classification {
            status: AttemptStatus::Pass,
            reason: String::new(),
        };
    }
    Classification {
        status: AttemptStatus::Fail,
        reason: extract_runtime_error(&combined),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi_color_codes() {
        let colored = "\x1b[31merror\x1b[0m: bad";
        assert_eq!(strip_ansi(colored), "error: bad");
    }

    #[test]
    fn zero_exit_is_pass() {
        let c = classify(0, "Tests run: 3, Failures: 0", "", false);
        assert_eq!(c.status, AttemptStatus::Pass);
    }

    #[test]
    fn compile_errors_take_priority_over_timeout() {
        let stdout = "COMPILATION ERROR : \n[INFO] -------------------------------------------------------------\n[INFO] bad symbol\n[INFO] 1 error\n";
        let c = classify(1, stdout, "", true);
        assert_eq!(c.status, AttemptStatus::Fail);
        assert!(c.reason.contains("bad symbol"));
    }

    #[test]
    fn timeout_without_compile_diagnostics_reports_timeout() {
        let c = classify(-1, "", "", true);
        assert_eq!(c.reason, "Timeout");
    }

    #[test]
    fn runtime_failure_extracts_failure_block() {
        let stdout = "testFoo <<< FAILURE!\njava.lang.AssertionError: expected 1 but was 2\n\n";
        let c = classify(1, stdout, "", false);
        assert!(c.reason.contains("AssertionError"));
    }

    #[test]
    fn unmatched_failure_falls_back_to_generic_marker() {
        let c = classify(1, "something broke", "", false);
        assert_eq!(c.reason, "Test failures");
    }
}
