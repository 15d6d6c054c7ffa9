//! Scenario runner
//!
//! Runs transfer scenarios end to end through [`CrossPlatformTransfer`]
//! against mock devices and checks the finished snapshot and the target
//! device against each scenario's expectations.

use super::scenarios::{ScenarioLibrary, TransferScenario};
use crate::core::orchestrator::CrossPlatformTransfer;
use crate::core::progress::{CrossTransferProgress, ProgressCallback};
use log::{debug, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub duration: Duration,
    /// One line per unmet expectation
    pub failures: Vec<String>,
    /// Final snapshot of the transfer
    pub progress: CrossTransferProgress,
}

/// Summary of a batch of scenario runs
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_duration: Duration,
    pub failed_scenarios: Vec<String>,
}

impl RunSummary {
    /// Calculate pass rate as percentage
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Print per-scenario details
    pub verbose: bool,
    /// Stop on first failure
    pub fail_fast: bool,
    /// Where staging directories are created
    pub work_dir: PathBuf,
    /// Keep staging directories after each run
    pub keep_staging: bool,
    /// Write `scenario_report.json` into this directory
    pub report_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            fail_fast: false,
            work_dir: std::env::temp_dir().join("device_migration_sim"),
            keep_staging: false,
            report_dir: None,
        }
    }
}

pub struct ScenarioRunner {
    config: RunnerConfig,
    results: Vec<ScenarioResult>,
}

impl ScenarioRunner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    pub fn run_all(&mut self) -> RunSummary {
        self.run_scenarios(ScenarioLibrary::all_scenarios())
    }

    pub fn run_quick(&mut self) -> RunSummary {
        self.run_scenarios(ScenarioLibrary::quick_scenarios())
    }

    pub fn run_by_tag(&mut self, tag: &str) -> RunSummary {
        self.run_scenarios(ScenarioLibrary::scenarios_by_tag(tag))
    }

    /// Run named scenarios; unknown names count as failures
    pub fn run_by_names(&mut self, names: &[String]) -> RunSummary {
        let mut scenarios = Vec::new();
        for name in names {
            match ScenarioLibrary::by_name(name) {
                Some(scenario) => scenarios.push(scenario),
                None => {
                    warn!("Unknown scenario: {}", name);
                    self.results.push(ScenarioResult {
                        name: name.clone(),
                        passed: false,
                        duration: Duration::ZERO,
                        failures: vec!["cenário desconhecido".to_string()],
                        progress: CrossTransferProgress::default(),
                    });
                }
            }
        }
        self.run_scenarios(scenarios)
    }

    pub fn run_scenarios(&mut self, scenarios: Vec<TransferScenario>) -> RunSummary {
        let start = Instant::now();
        for scenario in scenarios {
            let result = self.run_scenario(&scenario, None);
            self.print_result(&result);
            let stop = !result.passed && self.config.fail_fast;
            self.results.push(result);
            if stop {
                break;
            }
        }

        let mut summary = RunSummary {
            total: self.results.len(),
            total_duration: start.elapsed(),
            ..Default::default()
        };
        for result in &self.results {
            if result.passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
                summary.failed_scenarios.push(result.name.clone());
            }
        }

        self.print_summary(&summary);
        if let Some(dir) = self.config.report_dir.clone() {
            if let Err(e) = self.write_json_report(&dir, &summary) {
                warn!("Failed to write JSON report: {}", e);
            }
        }
        summary
    }

    /// Run one scenario, optionally observing its progress
    pub fn run_scenario(
        &self,
        scenario: &TransferScenario,
        callback: Option<ProgressCallback<CrossTransferProgress>>,
    ) -> ScenarioResult {
        let start = Instant::now();
        let registry = Arc::new(scenario.build_registry());
        let work_dir = self.config.work_dir.join(&scenario.name);

        let mut transfer = CrossPlatformTransfer::new(registry.clone(), &work_dir);
        if let Some(callback) = callback {
            transfer = transfer.with_callback(callback);
        }

        let source = scenario.source.serial();
        let target = scenario.target.serial();
        let succeeded = transfer.transfer(source, target, &scenario.config);
        let progress = transfer.progress();

        let mut failures = Vec::new();
        let expected = &scenario.expected;
        if succeeded != expected.should_succeed {
            failures.push(format!(
                "resultado {} (esperado {})",
                succeeded, expected.should_succeed
            ));
        }
        if progress.errors.len() != expected.errors {
            failures.push(format!(
                "{} erro(s) (esperado {}): {:?}",
                progress.errors.len(),
                expected.errors,
                progress.errors
            ));
        }
        if progress.warnings.len() < expected.min_warnings {
            failures.push(format!(
                "{} aviso(s) (esperado ao menos {})",
                progress.warnings.len(),
                expected.min_warnings
            ));
        }
        match registry.resolve(target) {
            Some(backend) => {
                for path in &expected.target_files {
                    if !backend.file_exists(target, path) {
                        failures.push(format!("arquivo ausente no destino: {}", path));
                    }
                }
            }
            None => failures.push(format!("destino não encontrado: {}", target)),
        }
        for (category, count) in &expected.pushed {
            let pushed = progress.report(*category).map(|r| r.pushed);
            if pushed != Some(*count) {
                failures.push(format!(
                    "{}: {:?} enviado(s) (esperado {})",
                    category.key(),
                    pushed,
                    count
                ));
            }
        }

        if !self.config.keep_staging {
            if let Err(e) = fs::remove_dir_all(&work_dir) {
                debug!("Could not remove {}: {}", work_dir.display(), e);
            }
        }

        ScenarioResult {
            name: scenario.name.clone(),
            passed: failures.is_empty(),
            duration: start.elapsed(),
            failures,
            progress,
        }
    }

    fn print_result(&self, result: &ScenarioResult) {
        let (status, color) = if result.passed {
            ("✓ PASS", "\x1b[32m")
        } else {
            ("✗ FAIL", "\x1b[31m")
        };
        println!(
            "  {}{}\x1b[0m - {} ({:.2}ms)",
            color,
            status,
            result.name,
            result.duration.as_secs_f64() * 1000.0
        );
        for failure in &result.failures {
            println!("      └─ {}", failure);
        }

        if self.config.verbose {
            for report in &result.progress.categories {
                println!(
                    "      · {:<10} ok={} copiados={} enviados={} erros={}",
                    report.category.key(),
                    report.success,
                    report.pulled,
                    report.pushed,
                    report.errors
                );
            }
            for warning in &result.progress.warnings {
                println!("      ⚠ {}", warning);
            }
        }
    }

    fn print_summary(&self, summary: &RunSummary) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      SCENARIO SUMMARY                        ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║  Total:     {:>4}                                             ║", summary.total);
        println!("║  Passed:    {:>4}                                             ║", summary.passed);
        println!("║  Failed:    {:>4}                                             ║", summary.failed);
        println!(
            "║  Pass Rate: {:>5.1}%                                          ║",
            summary.pass_rate()
        );
        println!(
            "║  Duration:  {:>5.2}s                                          ║",
            summary.total_duration.as_secs_f64()
        );
        println!("╚══════════════════════════════════════════════════════════════╝\n");
    }

    fn write_json_report(&self, dir: &Path, summary: &RunSummary) -> std::io::Result<PathBuf> {
        #[derive(Serialize)]
        struct Report<'a> {
            generated: String,
            summary: &'a RunSummary,
            results: &'a [ScenarioResult],
        }

        fs::create_dir_all(dir)?;
        let path = dir.join("scenario_report.json");
        let report = Report {
            generated: chrono::Utc::now().to_rfc3339(),
            summary,
            results: &self.results,
        };
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(&path, json)?;
        println!("JSON report written to: {}", path.display());
        Ok(path)
    }

    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}
