//! Declarative YAML checklists

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PageCheckError, PageCheckResult};
use crate::matcher::Matcher;
use crate::page::Viewport;

const BUNDLED_CHECKLIST: &str = include_str!("../checklists/frankis-motors.yaml");

/// An ordered list of checks to evaluate against one page load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    /// Unique name for this checklist
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Document to load when the caller does not supply one
    #[serde(default)]
    pub target: Option<String>,

    /// Viewport the page is opened with
    #[serde(default)]
    pub viewport: Viewport,

    /// Checks to evaluate, in display order
    pub checks: Vec<Check>,
}

/// A single declarative assertion against the rendered page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    /// Name used in the report
    pub name: String,

    /// What to extract and how to judge it
    #[serde(flatten)]
    pub kind: CheckKind,

    /// CSS selector locating the element(s)
    pub selector: String,

    /// Predicate over extracted values (attribute and text checks)
    #[serde(default)]
    pub matcher: Matcher,

    /// Optional checks are reported but never fail the run
    #[serde(default = "default_required")]
    pub required: bool,

    /// Detail reported when the check fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,

    /// Viewport change applied right before this check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<Resize>,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckKind {
    /// At least one element matches the selector
    ElementExists,

    /// A named attribute of some match is accepted by the matcher
    AttributeMatches { attribute: String },

    /// The text of some match is accepted by the matcher
    TextMatches,

    /// The text of some match contains one of the variants
    TextOneOf { variants: Vec<String> },

    /// A computed style property on the first match is non-empty
    ComputedStyleExists { property: String },

    /// At least `min` elements match the selector
    CountAtLeast { min: usize },
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::ElementExists => "element_exists",
            CheckKind::AttributeMatches { .. } => "attribute_matches",
            CheckKind::TextMatches => "text_matches",
            CheckKind::TextOneOf { .. } => "text_one_of",
            CheckKind::ComputedStyleExists { .. } => "computed_style_exists",
            CheckKind::CountAtLeast { .. } => "count_at_least",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resize {
    pub width: u32,
    pub height: u32,

    /// Time given to layout and transitions after resizing
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_settle_ms() -> u64 {
    500
}

impl Resize {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }
}

impl Check {
    fn new(name: impl Into<String>, kind: CheckKind, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            selector: selector.into(),
            matcher: Matcher::NonEmpty,
            required: true,
            failure: None,
            resize: None,
        }
    }

    pub fn element_exists(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::new(name, CheckKind::ElementExists, selector)
    }

    pub fn attribute_matches(
        name: impl Into<String>,
        selector: impl Into<String>,
        attribute: impl Into<String>,
        matcher: Matcher,
    ) -> Self {
        let kind = CheckKind::AttributeMatches {
            attribute: attribute.into(),
        };
        Self {
            matcher,
            ..Self::new(name, kind, selector)
        }
    }

    pub fn text_matches(name: impl Into<String>, selector: impl Into<String>, matcher: Matcher) -> Self {
        Self {
            matcher,
            ..Self::new(name, CheckKind::TextMatches, selector)
        }
    }

    pub fn text_one_of<S: Into<String>>(
        name: impl Into<String>,
        selector: impl Into<String>,
        variants: impl IntoIterator<Item = S>,
    ) -> Self {
        let kind = CheckKind::TextOneOf {
            variants: variants.into_iter().map(Into::into).collect(),
        };
        Self::new(name, kind, selector)
    }

    pub fn computed_style_exists(
        name: impl Into<String>,
        selector: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        let kind = CheckKind::ComputedStyleExists {
            property: property.into(),
        };
        Self::new(name, kind, selector)
    }

    pub fn count_at_least(name: impl Into<String>, selector: impl Into<String>, min: usize) -> Self {
        Self::new(name, CheckKind::CountAtLeast { min }, selector)
    }

    /// Mark the check as informational
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_failure(mut self, failure: impl Into<String>) -> Self {
        self.failure = Some(failure.into());
        self
    }

    pub fn with_resize(mut self, viewport: Viewport, settle_ms: u64) -> Self {
        self.resize = Some(Resize {
            width: viewport.width,
            height: viewport.height,
            settle_ms,
        });
        self
    }

    /// Detail used when the check fails without a query error
    pub fn failure_message(&self) -> String {
        if let Some(failure) = &self.failure {
            return failure.clone();
        }
        match &self.kind {
            CheckKind::ElementExists => format!("Missing element: {}", self.name),
            CheckKind::CountAtLeast { min } => {
                format!("Expected at least {} element(s) for {}", min, self.name)
            }
            _ => format!("{} not found or incorrect", self.name),
        }
    }

    /// Reject checks that could never judge the page meaningfully
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("check name must not be empty".to_string());
        }
        if self.selector.trim().is_empty() {
            return Err(format!("check '{}' has an empty selector", self.name));
        }
        match &self.kind {
            CheckKind::TextOneOf { variants } if variants.is_empty() => {
                return Err(format!("check '{}' needs at least one variant", self.name));
            }
            CheckKind::TextOneOf { variants } if variants.iter().any(|v| v.trim().is_empty()) => {
                return Err(format!("check '{}' has a blank variant", self.name));
            }
            CheckKind::CountAtLeast { min: 0 } => {
                return Err(format!("check '{}' needs min >= 1", self.name));
            }
            CheckKind::AttributeMatches { attribute } if attribute.is_empty() => {
                return Err(format!("check '{}' has an empty attribute name", self.name));
            }
            CheckKind::ComputedStyleExists { property } if property.is_empty() => {
                return Err(format!("check '{}' has an empty style property", self.name));
            }
            _ => {}
        }
        self.matcher
            .validate()
            .map_err(|e| format!("check '{}': {}", self.name, e))
    }
}

impl Checklist {
    /// Parse a checklist from YAML string
    pub fn from_yaml(yaml: &str) -> PageCheckResult<Self> {
        let checklist: Checklist = serde_yaml::from_str(yaml)?;
        checklist.validate()?;
        Ok(checklist)
    }

    /// Parse a checklist from a YAML file
    pub fn from_file(path: &Path) -> PageCheckResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Checklist for the Frankis Motors landing page shipped with the crate
    pub fn bundled() -> PageCheckResult<Self> {
        Self::from_yaml(BUNDLED_CHECKLIST)
    }

    pub fn validate(&self) -> PageCheckResult<()> {
        if self.checks.is_empty() {
            return Err(PageCheckError::ChecklistParse(format!(
                "checklist '{}' has no checks",
                self.name
            )));
        }
        for check in &self.checks {
            check.validate().map_err(PageCheckError::ChecklistParse)?;
        }
        Ok(())
    }

    pub fn required_count(&self) -> usize {
        self.checks.iter().filter(|c| c.required).count()
    }
}
