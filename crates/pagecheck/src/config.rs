//! Run configuration

use std::path::PathBuf;

use crate::page::Viewport;
use crate::playwright::DriverConfig;
use crate::report::Report;

/// Document loaded when neither the caller nor the checklist names one
pub const DEFAULT_TARGET: &str = "index.html";

/// Configuration for one checklist run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Browser driver settings
    pub driver: DriverConfig,

    /// Document to check; overrides the checklist's own target
    pub target: Option<String>,

    /// Directory relative targets are resolved against
    pub base_dir: PathBuf,

    /// Viewport override; otherwise the checklist's viewport is used
    pub viewport: Option<Viewport>,

    /// Report console/page errors without failing the run
    pub allow_page_errors: bool,

    /// Where to write the JSON report, if anywhere
    pub output: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            target: None,
            base_dir: PathBuf::from("."),
            viewport: None,
            allow_page_errors: false,
            output: None,
        }
    }
}

impl RunConfig {
    /// Target precedence: explicit, then the checklist's, then `index.html`
    pub fn target_for<'a>(&'a self, checklist_target: Option<&'a str>) -> &'a str {
        self.target
            .as_deref()
            .or(checklist_target)
            .unwrap_or(DEFAULT_TARGET)
    }

    /// Whether a finished report counts as a pass for this run
    pub fn passed(&self, report: &Report) -> bool {
        report.success() && (self.allow_page_errors || report.diagnostics().is_empty())
    }
}
