//! pagecheck: declarative smoke tests for rendered web pages
//!
//! This crate loads a single document in a headless browser and evaluates an
//! ordered checklist of content and structure assertions against it:
//! - Parses declarative YAML checklists
//! - Controls Playwright through a Node driver speaking JSON lines
//! - Evaluates every check, turning query errors into failed results
//! - Produces a report whose verdict drives the process exit code
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Session                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  target::resolve(path | url) -> Url                         │
//! │  PlaywrightPage::launch(DriverConfig, Url) -> impl Page     │
//! │  CheckRunner::run(&impl Page, &[Check]) -> Report           │
//! │  PlaywrightPage::close()                                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Checklist (YAML)                                           │
//! │    ├── name, description, target, viewport                  │
//! │    └── checks: [Check]                                      │
//! │          ├── element_exists { selector }                    │
//! │          ├── attribute_matches { selector, attribute }      │
//! │          ├── text_matches { selector, matcher }             │
//! │          ├── text_one_of { selector, variants }             │
//! │          ├── computed_style_exists { selector, property }   │
//! │          └── count_at_least { selector, min }               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod check;
pub mod config;
pub mod error;
pub mod matcher;
pub mod page;
pub mod playwright;
pub mod report;
pub mod runner;
pub mod session;
pub mod target;

pub use check::{Check, CheckKind, Checklist};
pub use config::RunConfig;
pub use error::{PageCheckError, PageCheckResult};
pub use matcher::Matcher;
pub use page::{Page, PageDiagnostic, Viewport};
pub use report::{CheckResult, Report};
pub use runner::CheckRunner;
pub use session::Session;
