//! Predicates applied to values extracted from the page

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Decides whether an extracted text or attribute value is acceptable.
///
/// Values are compared after trimming surrounding whitespace, since text
/// content pulled from markup usually carries indentation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Value contains the substring
    Contains(String),

    /// Value equals the string exactly
    Equals(String),

    /// Value starts with the prefix
    StartsWith(String),

    /// Value matches the regular expression
    Regex(String),

    /// Value is not blank
    #[default]
    NonEmpty,
}

impl Matcher {
    pub fn accepts(&self, value: &str) -> bool {
        let value = value.trim();
        match self {
            Matcher::Contains(needle) => value.contains(needle.as_str()),
            Matcher::Equals(expected) => value == expected.trim(),
            Matcher::StartsWith(prefix) => value.starts_with(prefix.as_str()),
            Matcher::Regex(pattern) => Regex::new(pattern)
                .map(|re| re.is_match(value))
                .unwrap_or(false),
            Matcher::NonEmpty => !value.is_empty(),
        }
    }

    /// Reject patterns that can never match anything meaningful.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Matcher::Regex(pattern) => Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| format!("invalid regex '{}': {}", pattern, e)),
            Matcher::Contains(s) | Matcher::Equals(s) | Matcher::StartsWith(s) if s.is_empty() => {
                Err(format!("{} matcher needs a non-empty value", self.label()))
            }
            _ => Ok(()),
        }
    }

    /// Accept the value if it contains any of the variants.
    ///
    /// Blank variants never match.
    pub fn any_of(variants: &[String], value: &str) -> Option<String> {
        let value = value.trim();
        variants
            .iter()
            .map(|variant| variant.trim())
            .find(|variant| !variant.is_empty() && value.contains(variant))
            .map(str::to_string)
    }

    fn label(&self) -> &'static str {
        match self {
            Matcher::Contains(_) => "contains",
            Matcher::Equals(_) => "equals",
            Matcher::StartsWith(_) => "starts_with",
            Matcher::Regex(_) => "regex",
            Matcher::NonEmpty => "non_empty",
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Contains(s) => write!(f, "contains '{}'", s),
            Matcher::Equals(s) => write!(f, "equals '{}'", s),
            Matcher::StartsWith(s) => write!(f, "starts with '{}'", s),
            Matcher::Regex(s) => write!(f, "matches /{}/", s),
            Matcher::NonEmpty => write!(f, "is non-empty"),
        }
    }
}
