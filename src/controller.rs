//! Iteration Controller (C13): the generate → validate → repair →
//! measure state machine, plus the non-iterative `run_symprompt`
//! entry point that shares the same validation primitives.

use crate::cfg::{build_methods, frontend::parse_java, paths::enumerate_paths};
use crate::classifier;
use crate::config::Config;
use crate::coverage::{join_paths_with_coverage, CoverageBackend};
use crate::errors::RunError;
use crate::integrator;
use crate::llm::{yaml::load_reply, Gateway};
use crate::model::{Attempt, AttemptStatus, Coverage, FailedTest, GeneratedTest, JunitVersion, Method, PathHistory};
use crate::prompt::branch_guidance;
use crate::prompt::{missed_lines_for_method, MethodGuidance, PromptBuilder, PromptContext};
use crate::report::Report;
use crate::repair::{additional_includes_from_dependencies, build_repair_messages, RepairQueue, RepairStyle};
use crate::runner::run_command;
use crate::selector::{pick_single_path, pick_two_paths};
use std::time::SystemTime;
use tracing::info;

pub struct Controller<'a, G: Gateway> {
    config: &'a Config,
    gateway: &'a G,
}

impl<'a, G: Gateway> Controller<'a, G> {
    pub fn new(config: &'a Config, gateway: &'a G) -> Self {
        Self { config, gateway }
    }

    pub fn run(&self) -> Result<Report, RunError> {
        if self.config.run_symprompt {
            return self.run_symprompt();
        }
        self.run_iterative()
    }

    fn coverage_backend(&self) -> Result<CoverageBackend, RunError> {
        CoverageBackend::from_name(&self.config.coverage_type.to_string(), self.config.project_directory.clone())
    }

    fn test_class_name(&self) -> String {
        self.config
            .test_code_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "GeneratedTest".to_string())
    }

    fn measure_coverage(&self) -> Result<Coverage, RunError> {
        let started_at = SystemTime::now();
        let outcome = run_command(
            &self.config.test_execution_command,
            Some(&self.config.test_code_command_dir),
            self.config.test_timeout,
        )?;
        if outcome.exit_code != 0 {
            return Err(RunError::TestRuntime(outcome.stderr));
        }
        self.coverage_backend()?.parse(&self.config.code_coverage_report_path, &self.config.source_code_file, started_at)
    }

    /// Integrates `test` into the output test file, runs the test
    /// command, classifies the result, and restores the original test
    /// file byte-for-byte on any failure (§5 resource policy) — a
    /// launch/runtime error is still a failure for this purpose, not
    /// just a classified test fail.
    fn validate_candidate(&self, test: &GeneratedTest, label: &str, source_imports: &str) -> Result<(Attempt, Option<FailedTest>), RunError> {
        let original = std::fs::read_to_string(&self.config.test_file_output_path).unwrap_or_default();
        let merged = integrator::integrate(
            &original,
            std::slice::from_ref(test),
            JunitVersion::from(self.config.junit_version),
            &self.test_class_name(),
            source_imports,
        )?;
        std::fs::write(&self.config.test_file_output_path, &merged)?;

        let started_at = SystemTime::now();
        let outcome = run_command(&self.config.test_execution_command, Some(&self.config.test_code_command_dir), self.config.test_timeout);

        let (exit_code, stdout, stderr, timed_out) = match &outcome {
            Ok(o) => (o.exit_code, o.stdout.clone(), o.stderr.clone(), false),
            Err(RunError::Timeout) => (-1, String::new(), String::new(), true),
            Err(e) => {
                std::fs::write(&self.config.test_file_output_path, &original)?;
                return Err(RunError::Internal(e.to_string()));
            }
        };

        let classification = classifier::classify(exit_code, &stdout, &stderr, timed_out);

        if classification.status != AttemptStatus::Pass {
            std::fs::write(&self.config.test_file_output_path, &original)?;
            let attempt = Attempt {
                label: label.to_string(),
                status: AttemptStatus::Fail,
                reason: classification.reason.clone(),
                exit_code,
                stderr: stderr.clone(),
                stdout_excerpt: stdout.chars().take(2000).collect(),
                test: test.test_name.clone(),
                line_pct: 0.0,
                branch_pct: 0.0,
            };
            let failed = FailedTest { code: test.clone(), error_message: classification.reason };
            return Ok((attempt, Some(failed)));
        }

        let coverage = self
            .coverage_backend()?
            .parse(&self.config.code_coverage_report_path, &self.config.source_code_file, started_at);
        let (line_pct, branch_pct) = match coverage {
            Ok(c) => (c.line_pct, c.branch_pct),
            Err(_) => (0.0, 0.0),
        };

        let attempt = Attempt {
            label: label.to_string(),
            status: AttemptStatus::Pass,
            reason: String::new(),
            exit_code,
            stderr: String::new(),
            stdout_excerpt: stdout.chars().take(2000).collect(),
            test: test.test_name.clone(),
            line_pct,
            branch_pct,
        };
        Ok((attempt, None))
    }

    fn prompt_context<'b>(
        &self,
        source_text: &'b str,
        test_text: &'b str,
        included_files: &str,
    ) -> PromptContext<'b> {
        PromptContext {
            source_path: self.config.source_code_file.to_string_lossy().to_string(),
            test_path: self.config.test_code_file.to_string_lossy().to_string(),
            source_text,
            test_text,
            included_files: included_files.to_string(),
            additional_instructions: self.config.additional_instructions.clone(),
        }
    }

    /// Renders the "Additional Includes" section once per run: raw
    /// contents of `config.included_files` plus the cleaned output of
    /// `test_dependency_command`, each wrapped only if non-empty.
    fn additional_includes(&self) -> String {
        let mut raw = String::new();
        for path in &self.config.included_files {
            if let Ok(contents) = std::fs::read_to_string(path) {
                raw.push_str(&format!("--- {} ---\n{}\n", path.display(), contents));
            }
        }
        let files_section = crate::prompt::templates::additional_includes_section(&raw);

        let dependency_section = if self.config.test_dependency_command.trim().is_empty() {
            String::new()
        } else {
            match run_command(&self.config.test_dependency_command, Some(&self.config.test_code_command_dir), self.config.test_timeout) {
                Ok(outcome) => additional_includes_from_dependencies(&outcome.stdout),
                Err(_) => String::new(),
            }
        };

        format!("{files_section}{dependency_section}")
    }

    fn request_tests(&self, messages: &crate::prompt::Messages) -> Result<Vec<GeneratedTest>, RunError> {
        let completion = self.gateway.call(messages, 4096)?;
        match load_reply(&completion.text) {
            Ok(reply) => Ok(reply.new_tests),
            Err(_) => Ok(Vec::new()),
        }
    }

    fn run_repair_rounds(&self, mut queue: RepairQueue, ctx: &PromptContext, iter: u32, source_imports: &str) -> Result<Vec<Attempt>, RunError> {
        let mut attempts = Vec::new();
        for round in 0..self.config.enable_fixing {
            if queue.is_empty() {
                break;
            }
            let batch = queue.drain_round();
            let messages = build_repair_messages(ctx, &batch, RepairStyle::Plain)?;
            let tests = self.request_tests(&messages)?;
            for (k, test) in tests.iter().enumerate() {
                let label = format!("f_{iter}_{}", round * 1000 + k as u32);
                let (attempt, failed) = self.validate_candidate(test, &label, source_imports)?;
                attempts.push(attempt);
                if let Some(f) = failed {
                    queue.push(f);
                }
            }
        }
        Ok(attempts)
    }

    fn run_iterative(&self) -> Result<Report, RunError> {
        let mut report = Report::new();
        let mut history = PathHistory::default();
        let mut iter = 0u32;
        let mut no_gain_streak = 0u32;
        let mut last_line_pct = 0.0;
        let mut last_branch_pct = 0.0;

        let source_text = std::fs::read_to_string(&self.config.source_code_file)?;
        let unit = parse_java(&source_text).map_err(RunError::Analysis)?;
        let build_outcome = build_methods(&unit);
        info!(dropped = build_outcome.summary.complexity_zero_methods, "complexity-0 methods excluded from generation");
        let source_imports = integrator::extract_import_block(&source_text)?;
        let included_files = self.additional_includes();

        loop {
            if last_line_pct >= self.config.target_coverage as f64 / 100.0 {
                info!(iter, "target coverage reached");
                break;
            }
            if iter >= self.config.maximum_iterations {
                info!(iter, "maximum_iterations reached");
                break;
            }
            if no_gain_streak >= self.config.no_coverage_increase_iterations {
                info!(iter, no_gain_streak, "stagnation stop");
                break;
            }

            let test_text = std::fs::read_to_string(&self.config.test_file_output_path).unwrap_or_default();
            let ctx = self.prompt_context(&source_text, &test_text, &included_files);

            let baseline_mode = last_line_pct == 0.0 && last_branch_pct == 0.0;
            let messages = if baseline_mode {
                PromptBuilder::build_baseline(&ctx, &build_outcome.methods)?
            } else {
                let (guidance, branch_hints) = self.build_guidance(&build_outcome.methods, &unit, &mut history)?;
                match self.config.prompt_type {
                    crate::config::types::PromptType::Control => PromptBuilder::build_control(&ctx, &guidance, &branch_hints)?,
                    _ => PromptBuilder::build_coverage(&ctx, &guidance, &branch_hints)?,
                }
            };

            let tests = self.request_tests(&messages)?;
            let mut queue = RepairQueue::default();
            for (k, test) in tests.iter().enumerate() {
                let label = format!("g_{iter}_{k}");
                let (attempt, failed) = self.validate_candidate(test, &label, &source_imports)?;
                report.record(attempt);
                if let Some(f) = failed {
                    queue.push(f);
                }
            }

            let post_generation = self.measure_coverage().unwrap_or_default();
            report.record(Attempt {
                label: format!("g_{iter}"),
                status: AttemptStatus::Info,
                reason: String::new(),
                exit_code: 0,
                stderr: String::new(),
                stdout_excerpt: String::new(),
                test: String::new(),
                line_pct: post_generation.line_pct,
                branch_pct: post_generation.branch_pct,
            });

            let repair_attempts = self.run_repair_rounds(queue, &ctx, iter, &source_imports)?;
            for attempt in repair_attempts {
                report.record(attempt);
            }

            let post_repair = self.measure_coverage().unwrap_or(post_generation.clone());
            report.record(Attempt {
                label: format!("f_{iter}"),
                status: AttemptStatus::Info,
                reason: String::new(),
                exit_code: 0,
                stderr: String::new(),
                stdout_excerpt: String::new(),
                test: String::new(),
                line_pct: post_repair.line_pct,
                branch_pct: post_repair.branch_pct,
            });

            if post_repair.line_pct > last_line_pct || post_repair.branch_pct > last_branch_pct {
                no_gain_streak = 0;
            } else {
                no_gain_streak += 1;
            }
            last_line_pct = post_repair.line_pct;
            last_branch_pct = post_repair.branch_pct;
            iter += 1;
        }

        report.write(std::path::Path::new(&self.config.report_filepath), &self.config.report_label())?;
        Ok(report)
    }

    fn build_guidance(&self, methods: &[Method], unit: &crate::cfg::frontend::ParsedUnit, history: &mut PathHistory) -> Result<(Vec<MethodGuidance>, Vec<String>), RunError> {
        let coverage = self.measure_coverage().unwrap_or_default();
        let mut guidance = Vec::new();
        let mut branch_hints = Vec::new();
        for method in methods {
            branch_hints.extend(branch_guidance::guidance_for(method, &coverage.missed_branches));

            if method.cyclomatic_complexity <= 1 {
                let missed = missed_lines_for_method(method, &unit.line_map, &coverage.missed_lines);
                guidance.push(MethodGuidance::MissedLines { method_name: method.name.clone(), missed_lines: missed });
                continue;
            }
            let candidates = enumerate_paths(method, self.config.path_enumeration_timeout);
            let joined = join_paths_with_coverage(method, candidates, &unit.line_map, &coverage);
            if joined.is_empty() {
                continue;
            }
            if self.config.pick_two_paths {
                if let Some(selection) = pick_two_paths(joined, history) {
                    guidance.push(MethodGuidance::Path { method_name: method.name.clone(), condition_trace: selection.exploit.condition_trace });
                    if let Some(explore) = selection.explore {
                        guidance.push(MethodGuidance::Path { method_name: method.name.clone(), condition_trace: explore.condition_trace });
                    }
                }
            } else if let Some(path) = pick_single_path(joined, history) {
                guidance.push(MethodGuidance::Path { method_name: method.name.clone(), condition_trace: path.condition_trace });
            }
        }
        Ok((guidance, branch_hints))
    }

    fn run_symprompt(&self) -> Result<Report, RunError> {
        let mut report = Report::new();
        let source_text = std::fs::read_to_string(&self.config.source_code_file)?;
        let unit = parse_java(&source_text).map_err(RunError::Analysis)?;
        let build_outcome = build_methods(&unit);
        let source_imports = integrator::extract_import_block(&source_text)?;
        let included_files = self.additional_includes();

        let mut k = 0usize;
        for method in &build_outcome.methods {
            let paths = enumerate_paths(method, self.config.path_enumeration_timeout);
            if paths.is_empty() {
                continue;
            }
            let test_text = std::fs::read_to_string(&self.config.test_file_output_path).unwrap_or_default();
            let ctx = self.prompt_context(&source_text, &test_text, &included_files);
            let messages = PromptBuilder::build_symprompt(&ctx, &method.name, &paths)?;
            let tests = self.request_tests(&messages)?;
            for test in &tests {
                let label = format!("symprompt_{k}");
                let (attempt, _failed) = self.validate_candidate(test, &label, &source_imports)?;
                report.record(attempt);
                k += 1;
            }
        }

        let final_coverage = self.measure_coverage().unwrap_or_default();
        report.record(Attempt {
            label: "symprompt_final".to_string(),
            status: AttemptStatus::Info,
            reason: String::new(),
            exit_code: 0,
            stderr: String::new(),
            stdout_excerpt: String::new(),
            test: String::new(),
            line_pct: final_coverage.line_pct,
            branch_pct: final_coverage.branch_pct,
        });

        report.write(std::path::Path::new(&self.config.report_filepath), &self.config.report_label())?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Completion;
    use crate::prompt::Messages;
    use std::cell::RefCell;

    struct ScriptedGateway {
        replies: RefCell<Vec<String>>,
    }

    impl Gateway for ScriptedGateway {
        fn call(&self, _messages: &Messages, _max_tokens: u32) -> Result<Completion, RunError> {
            let text = self.replies.borrow_mut().pop().unwrap_or_default();
            Ok(Completion { text, usage: Default::default() })
        }
    }

    #[test]
    fn empty_llm_reply_yields_no_generated_tests() {
        let gateway = ScriptedGateway { replies: RefCell::new(vec!["just some prose, no yaml here".to_string()]) };
        let config = Config::default();
        let controller = Controller::new(&config, &gateway);
        let messages = Messages { system: String::new(), user: String::new() };
        let tests = controller.request_tests(&messages).unwrap();
        assert!(tests.is_empty());
    }

    #[test]
    fn coverage_backend_rejects_unknown_type_string() {
        let mut config = Config::default();
        config.project_directory = std::path::PathBuf::from(".");
        let gateway = ScriptedGateway { replies: RefCell::new(Vec::new()) };
        let controller = Controller::new(&config, &gateway);
        assert!(controller.coverage_backend().is_ok());
    }

    #[test]
    fn test_class_name_falls_back_when_unset() {
        let config = Config::default();
        let gateway = ScriptedGateway { replies: RefCell::new(Vec::new()) };
        let controller = Controller::new(&config, &gateway);
        assert_eq!(controller.test_class_name(), "GeneratedTest");
    }
}
