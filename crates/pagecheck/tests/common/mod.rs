//! In-memory page used to exercise the runner without a browser.
//!
//! Elements are matched by selector string equality: each element lists the
//! exact selectors that should find it.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use pagecheck::{Page, PageCheckError, PageCheckResult, PageDiagnostic, Viewport};

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    selectors: Vec<String>,
    text: String,
    attributes: HashMap<String, String>,
    styles: HashMap<String, String>,
    max_width: Option<u32>,
}

impl FakeElement {
    pub fn new(selectors: &[&str]) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.styles.insert(property.to_string(), value.to_string());
        self
    }

    pub fn matches(&self, selector: &str) -> bool {
        self.selectors.iter().any(|s| s == selector)
    }

    /// Only rendered while the viewport is at most `width` wide
    pub fn only_below(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }
}

pub struct FakePage {
    elements: Vec<FakeElement>,
    broken: Vec<String>,
    stuck_at: Option<Viewport>,
    diagnostics: Vec<PageDiagnostic>,
    viewport: Mutex<Viewport>,
    resizes: Mutex<Vec<Viewport>>,
}

impl FakePage {
    pub fn new(elements: Vec<FakeElement>) -> Self {
        Self {
            elements,
            broken: Vec::new(),
            stuck_at: None,
            diagnostics: Vec::new(),
            viewport: Mutex::new(Viewport::default()),
            resizes: Mutex::new(Vec::new()),
        }
    }

    /// Queries for `selector` fail the way an invalid selector would
    pub fn with_broken_selector(mut self, selector: &str) -> Self {
        self.broken.push(selector.to_string());
        self
    }

    /// Once resized to `viewport`, further resizes fail
    pub fn stuck_at(mut self, viewport: Viewport) -> Self {
        self.stuck_at = Some(viewport);
        self
    }

    pub fn with_diagnostic(mut self, diagnostic: PageDiagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }

    pub fn viewport(&self) -> Viewport {
        *self.viewport.lock().unwrap()
    }

    pub fn resizes(&self) -> Vec<Viewport> {
        self.resizes.lock().unwrap().clone()
    }

    fn matching(&self, selector: &str) -> PageCheckResult<Vec<&FakeElement>> {
        if self.broken.iter().any(|b| b == selector) {
            return Err(PageCheckError::Query(format!(
                "'{}' is not a valid selector",
                selector
            )));
        }
        let width = self.viewport().width;
        Ok(self
            .elements
            .iter()
            .filter(|el| el.matches(selector))
            .filter(|el| el.max_width.map_or(true, |max| width <= max))
            .collect())
    }
}

#[async_trait]
impl Page for FakePage {
    async fn count(&self, selector: &str) -> PageCheckResult<usize> {
        Ok(self.matching(selector)?.len())
    }

    async fn attributes(&self, selector: &str, attribute: &str) -> PageCheckResult<Vec<Option<String>>> {
        Ok(self
            .matching(selector)?
            .into_iter()
            .map(|el| el.attributes.get(attribute).cloned())
            .collect())
    }

    async fn texts(&self, selector: &str) -> PageCheckResult<Vec<String>> {
        Ok(self
            .matching(selector)?
            .into_iter()
            .map(|el| el.text.clone())
            .collect())
    }

    async fn computed_style(&self, selector: &str, property: &str) -> PageCheckResult<Option<String>> {
        Ok(self
            .matching(selector)?
            .first()
            .map(|el| el.styles.get(property).cloned().unwrap_or_default()))
    }

    async fn set_viewport(&self, viewport: Viewport) -> PageCheckResult<()> {
        let mut current = self.viewport.lock().unwrap();
        if self.stuck_at == Some(*current) {
            return Err(PageCheckError::Timeout(format!("viewport:{}x{}", viewport.width, viewport.height)));
        }
        *current = viewport;
        self.resizes.lock().unwrap().push(viewport);
        Ok(())
    }

    async fn diagnostics(&self) -> PageCheckResult<Vec<PageDiagnostic>> {
        Ok(self.diagnostics.clone())
    }
}

pub const TEL_LINK: &str = "a[href^='tel:']";

/// `<nav class="navbar">`, `<div class="hero">` and a tel link
pub fn landing_elements() -> Vec<FakeElement> {
    vec![
        FakeElement::new(&[".navbar", "nav"]),
        FakeElement::new(&[".hero"]).style("background", "rgb(15, 32, 67) none repeat scroll 0% 0%"),
        FakeElement::new(&[TEL_LINK, "a"])
            .attr("href", "tel:+263784150992")
            .text("+263 78 415 0992"),
    ]
}

/// Every element the bundled Frankis Motors checklist looks for
pub fn frankis_motors_elements() -> Vec<FakeElement> {
    vec![
        FakeElement::new(&["title"]).text("Frankis Motors | Auto Repairs Harare"),
        FakeElement::new(&[".navbar"]),
        FakeElement::new(&[".logo-text"]).text("Frankis Motors"),
        FakeElement::new(&[".mobile-toggle"]).only_below(768),
        FakeElement::new(&[".hero"]).style("background", "linear-gradient(rgb(10, 10, 10), rgb(200, 0, 0))"),
        FakeElement::new(&[".hero a[href*='wa.me']"]).attr("href", "https://wa.me/263784150992"),
        FakeElement::new(&["#services"]),
        FakeElement::new(&[".service-card"]),
        FakeElement::new(&[".service-card"]),
        FakeElement::new(&[".graphic-item"]),
        FakeElement::new(&[".graphic-item img"]).attr("src", "images/work1.jpg").attr("alt", "Engine rebuild"),
        FakeElement::new(&[".graphic-item img"]).attr("src", "images/work2.jpg"),
        FakeElement::new(&["#about"]),
        FakeElement::new(&[".about-img-main"]).attr("src", "images/workshop.jpg"),
        FakeElement::new(&["#contact"]),
        FakeElement::new(&[TEL_LINK]).attr("href", "tel:+263784150992").text("+263 784 150 992"),
        FakeElement::new(&[".contact-item a[href^='https://maps']"])
            .attr("href", "https://maps.google.com/?q=23+Honey+Drive")
            .text("\n    23 Honey Drive, Harare\n  "),
        FakeElement::new(&[".footer"]),
        FakeElement::new(&[".social-links a[href*='wa.me']"]).attr("href", "https://wa.me/263784150992"),
        FakeElement::new(&[".whatsapp-float"]).attr("href", "https://wa.me/263784150992?text=Hi"),
    ]
}
