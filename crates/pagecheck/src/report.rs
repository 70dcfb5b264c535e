//! Check outcomes and the aggregated report

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::check::Check;
use crate::error::PageCheckResult;
use crate::page::PageDiagnostic;

/// Outcome of evaluating one check against one page load
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub check: Check,
    pub passed: bool,
    pub detail: String,
    pub duration_ms: u64,
}

impl CheckResult {
    pub fn name(&self) -> &str {
        &self.check.name
    }

    /// Failed and counts against the run
    pub fn is_blocking(&self) -> bool {
        !self.passed && self.check.required
    }

    fn marker(&self) -> &'static str {
        match (self.passed, self.check.required) {
            (true, _) => "✓",
            (false, true) => "✗",
            (false, false) => "○",
        }
    }
}

/// Results of one checklist against one page, in checklist order
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    checklist: String,
    target: String,
    started_at: DateTime<Utc>,
    duration_ms: u64,
    success: bool,
    results: Vec<CheckResult>,
    diagnostics: Vec<PageDiagnostic>,
}

impl Report {
    pub fn new(
        checklist: impl Into<String>,
        target: impl Into<String>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        results: Vec<CheckResult>,
    ) -> Self {
        let success = results.iter().all(|r| r.passed || !r.check.required);
        Self {
            checklist: checklist.into(),
            target: target.into(),
            started_at,
            duration_ms,
            success,
            results,
            diagnostics: Vec::new(),
        }
    }

    /// Attach console and script errors observed while the page was open
    pub fn with_diagnostics(mut self, diagnostics: Vec<PageDiagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Every required check passed
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn diagnostics(&self) -> &[PageDiagnostic] {
        &self.diagnostics
    }

    pub fn checklist(&self) -> &str {
        &self.checklist
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Required checks that failed
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| r.is_blocking())
    }

    /// Optional checks that failed
    pub fn warnings(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed && !r.check.required)
    }

    /// Write the report as pretty JSON to `output`
    pub fn write_json(&self, output: &Path) -> PageCheckResult<PathBuf> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(output, json)?;

        info!("Results written to: {}", output.display());
        Ok(output.to_path_buf())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            write!(f, "{} {}: {}", result.marker(), result.name(), result.detail)?;
            if !result.passed && !result.check.required {
                write!(f, " (optional)")?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(f, "--- Test Results ---")?;

        let failures: Vec<&CheckResult> = self.failures().collect();
        if failures.is_empty() {
            writeln!(f, "✓ All required checks passed.")?;
        } else {
            writeln!(f, "✗ Checks completed with errors:")?;
            for failure in &failures {
                writeln!(f, "  - {}", failure.detail)?;
            }
        }

        if !self.diagnostics.is_empty() {
            writeln!(f, "Page reported {} error(s):", self.diagnostics.len())?;
            for diagnostic in &self.diagnostics {
                writeln!(f, "  - {}", diagnostic)?;
            }
        }

        write!(
            f,
            "{}: {} passed, {} failed, {} optional failed ({} ms)",
            self.checklist,
            self.passed(),
            failures.len(),
            self.warnings().count(),
            self.duration_ms
        )
    }
}
