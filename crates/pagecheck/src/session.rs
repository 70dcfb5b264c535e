//! One page load: launch, check, collect, close

use std::path::Path;
use tracing::{info, warn};

use crate::check::Checklist;
use crate::config::RunConfig;
use crate::error::PageCheckResult;
use crate::page::{Page, Viewport};
use crate::playwright::PlaywrightPage;
use crate::report::Report;
use crate::runner::CheckRunner;
use crate::target;

/// Run a checklist against an already loaded page and attach whatever
/// console or script errors the page reported along the way.
pub async fn check_page<P: Page + ?Sized>(
    page: &P,
    checklist: &Checklist,
    target: &str,
    viewport: Viewport,
) -> Report {
    let runner = CheckRunner::new(&checklist.name, target).with_viewport(viewport);
    let report = runner.run(page, &checklist.checks).await;

    let diagnostics = match page.diagnostics().await {
        Ok(diagnostics) => diagnostics,
        Err(e) => {
            warn!("Could not collect page diagnostics: {}", e);
            Vec::new()
        }
    };
    for diagnostic in &diagnostics {
        warn!("{}", diagnostic);
    }

    report.with_diagnostics(diagnostics)
}

/// Write the JSON report, keeping the in-memory report usable on failure
fn save_report(report: &Report, output: &Path) -> bool {
    match report.write_json(output) {
        Ok(_) => true,
        Err(e) => {
            warn!("Failed to write results to {}: {}", output.display(), e);
            false
        }
    }
}

/// Drives a checklist through a Playwright page
pub struct Session {
    config: RunConfig,
}

impl Session {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Load the target and evaluate the checklist against it.
    ///
    /// Errors here are fatal: the target could not be resolved, or the
    /// browser could not be launched or navigated. The browser is closed on
    /// every path once it has been launched.
    pub async fn run(&self, checklist: &Checklist) -> PageCheckResult<Report> {
        let target = self.config.target_for(checklist.target.as_deref());
        let url = target::resolve(target, &self.config.base_dir)?;

        let viewport = self.config.viewport.unwrap_or(checklist.viewport);
        let mut driver = self.config.driver.clone();
        driver.viewport = viewport;

        let page = PlaywrightPage::launch(&driver, &url).await?;
        let report = check_page(&page, checklist, url.as_str(), viewport).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }

        if let Some(output) = &self.config.output {
            save_report(&report, output);
        }

        info!(
            "{} against {}: {}",
            checklist.name,
            url,
            if self.config.passed(&report) { "passed" } else { "failed" }
        );
        Ok(report)
    }
}
