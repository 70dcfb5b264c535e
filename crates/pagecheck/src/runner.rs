//! Evaluates a checklist against a loaded page

use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::check::{Check, CheckKind};
use crate::error::PageCheckResult;
use crate::matcher::Matcher;
use crate::page::{Page, Viewport};
use crate::report::{CheckResult, Report};

/// What a check saw on the page
struct Verdict {
    passed: bool,
    observed: String,
}

impl Verdict {
    fn pass(observed: impl Into<String>) -> Self {
        Self { passed: true, observed: observed.into() }
    }

    fn fail(observed: impl Into<String>) -> Self {
        Self { passed: false, observed: observed.into() }
    }
}

/// Runs checks one after another against a single page.
///
/// Checks never abort the run: query errors and invalid checks become failed
/// results. A check with a `resize` pre-step gets its own viewport, and the
/// base viewport is put back before the next check so results do not depend
/// on order. If that restore fails, the resized check fails with it.
pub struct CheckRunner {
    name: String,
    target: String,
    viewport: Viewport,
}

impl CheckRunner {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            viewport: Viewport::default(),
        }
    }

    /// Viewport the page was opened with
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Evaluate every check and build the report
    pub async fn run<P: Page + ?Sized>(&self, page: &P, checks: &[Check]) -> Report {
        let started_at = Utc::now();
        let start = Instant::now();

        info!("Running {} check(s) against {}", checks.len(), self.target);

        let mut results = Vec::with_capacity(checks.len());
        for check in checks {
            results.push(self.evaluate(page, check).await);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let report = Report::new(&self.name, &self.target, started_at, duration_ms, results);

        info!(
            "Check results: {} passed, {} failed, {} optional failed ({} ms)",
            report.passed(),
            report.failures().count(),
            report.warnings().count(),
            duration_ms
        );

        report
    }

    /// Evaluate a single check, downgrading query errors to a failed result
    pub async fn evaluate<P: Page + ?Sized>(&self, page: &P, check: &Check) -> CheckResult {
        let start = Instant::now();
        debug!("Evaluating {} ({})", check.name, check.kind.as_str());

        let (passed, detail) = match check.validate() {
            Ok(()) => self.judged(page, check).await,
            Err(reason) => (false, format!("Invalid check: {}", reason)),
        };

        match (passed, check.required) {
            (true, _) => debug!("✓ {} - {}", check.name, detail),
            (false, true) => error!("✗ {} - {}", check.name, detail),
            (false, false) => warn!("○ {} - {} (optional)", check.name, detail),
        }

        CheckResult {
            check: check.clone(),
            passed,
            detail,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn judged<P: Page + ?Sized>(&self, page: &P, check: &Check) -> (bool, String) {
        let Some(resize) = check.resize else {
            return conclude(check, judge(page, check).await);
        };

        let (passed, detail) = conclude(
            check,
            self.resized(page, check, resize.viewport(), resize.settle_ms).await,
        );

        // A failed restore leaves every later check at the wrong size
        match self.restore(page, resize.settle_ms).await {
            Ok(()) => (passed, detail),
            Err(e) => {
                warn!("Failed to restore viewport {} after {}: {}", self.viewport, check.name, e);
                (
                    false,
                    format!("{} (viewport not restored to {}: {})", detail, self.viewport, e),
                )
            }
        }
    }

    async fn resized<P: Page + ?Sized>(
        &self,
        page: &P,
        check: &Check,
        viewport: Viewport,
        settle_ms: u64,
    ) -> PageCheckResult<Verdict> {
        debug!("Resizing viewport to {} for {}", viewport, check.name);
        page.set_viewport(viewport).await?;
        settle(settle_ms).await;
        judge(page, check).await
    }

    async fn restore<P: Page + ?Sized>(&self, page: &P, settle_ms: u64) -> PageCheckResult<()> {
        page.set_viewport(self.viewport).await?;
        settle(settle_ms).await;
        Ok(())
    }
}

fn conclude(check: &Check, outcome: PageCheckResult<Verdict>) -> (bool, String) {
    match outcome {
        Ok(verdict) if verdict.passed => (true, verdict.observed),
        Ok(verdict) => {
            debug!("{}: {}", check.name, verdict.observed);
            (false, check.failure_message())
        }
        Err(e) => (false, e.to_string()),
    }
}

async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

async fn judge<P: Page + ?Sized>(page: &P, check: &Check) -> PageCheckResult<Verdict> {
    let selector = check.selector.as_str();

    let verdict = match &check.kind {
        CheckKind::ElementExists => {
            let count = page.count(selector).await?;
            if count > 0 {
                Verdict::pass(format!("found {} element(s)", count))
            } else {
                Verdict::fail(format!("no element matches '{}'", selector))
            }
        }

        CheckKind::CountAtLeast { min } => {
            let count = page.count(selector).await?;
            let observed = format!("found {} element(s), need at least {}", count, min);
            if count >= *min {
                Verdict::pass(observed)
            } else {
                Verdict::fail(observed)
            }
        }

        CheckKind::AttributeMatches { attribute } => {
            let values = page.attributes(selector, attribute).await?;
            if values.is_empty() {
                return Ok(Verdict::fail(format!("no element matches '{}'", selector)));
            }
            let accepted = values
                .iter()
                .flatten()
                .find(|value| check.matcher.accepts(value));
            match accepted {
                Some(value) => Verdict::pass(format!("{}=\"{}\"", attribute, value.trim())),
                None => Verdict::fail(format!(
                    "{} value(s) of '{}' where none {}: {:?}",
                    values.len(),
                    attribute,
                    check.matcher,
                    values
                )),
            }
        }

        CheckKind::TextMatches => {
            let texts = page.texts(selector).await?;
            if texts.is_empty() {
                return Ok(Verdict::fail(format!("no element matches '{}'", selector)));
            }
            match texts.iter().find(|text| check.matcher.accepts(text)) {
                Some(text) => Verdict::pass(format!("text \"{}\"", text.trim())),
                None => Verdict::fail(format!("text found: {}", join_trimmed(&texts))),
            }
        }

        CheckKind::TextOneOf { variants } => {
            let texts = page.texts(selector).await?;
            if texts.is_empty() {
                return Ok(Verdict::fail(format!("no element matches '{}'", selector)));
            }
            let hit = texts
                .iter()
                .find_map(|text| Matcher::any_of(variants, text).map(|variant| (text, variant)));
            match hit {
                Some((text, variant)) => {
                    Verdict::pass(format!("text \"{}\" matches '{}'", text.trim(), variant))
                }
                None => Verdict::fail(format!("text found: {}", join_trimmed(&texts))),
            }
        }

        CheckKind::ComputedStyleExists { property } => {
            match page.computed_style(selector, property).await? {
                Some(value) if !value.trim().is_empty() => {
                    Verdict::pass(format!("{}: {}", property, value.trim()))
                }
                Some(_) => Verdict::fail(format!("{} is empty", property)),
                None => Verdict::fail(format!("no element matches '{}'", selector)),
            }
        }
    };

    Ok(verdict)
}

fn join_trimmed(values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .collect::<Vec<_>>()
        .join(", ")
}
