//! Query interface over a loaded page

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PageCheckResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { width: 1280, height: 720 }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Something the page reported on its own while loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "message", rename_all = "snake_case")]
pub enum PageDiagnostic {
    /// `console.error(...)` output
    Console(String),
    /// Uncaught exception in page script
    PageError(String),
}

impl fmt::Display for PageDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageDiagnostic::Console(msg) => write!(f, "Console Error: {}", msg),
            PageDiagnostic::PageError(msg) => write!(f, "Page Error: {}", msg),
        }
    }
}

/// A page that has already been navigated and settled.
///
/// Every query reads from the current DOM. Only `set_viewport` changes page
/// state, and the runner calls it solely as an explicit pre-step.
#[async_trait]
pub trait Page: Send + Sync {
    /// Number of elements matching `selector`
    async fn count(&self, selector: &str) -> PageCheckResult<usize>;

    /// Value of `attribute` on every element matching `selector`, in document
    /// order. Elements without the attribute yield `None`.
    async fn attributes(&self, selector: &str, attribute: &str) -> PageCheckResult<Vec<Option<String>>>;

    /// Text content of every element matching `selector`, in document order
    async fn texts(&self, selector: &str) -> PageCheckResult<Vec<String>>;

    /// Computed value of a style property on the first match, or `None`
    /// when nothing matches
    async fn computed_style(&self, selector: &str, property: &str) -> PageCheckResult<Option<String>>;

    /// Resize the viewport
    async fn set_viewport(&self, viewport: Viewport) -> PageCheckResult<()>;

    /// Console and script errors collected since the page was opened
    async fn diagnostics(&self) -> PageCheckResult<Vec<PageDiagnostic>>;
}
