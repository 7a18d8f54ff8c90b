//! Structural verification of page sections.
//!
//! A section is a header, a container and a repeating collection of items,
//! optionally with per-item labels, icons and content panels. Verification
//! answers one question, "is this section rendered and usable", with one
//! boolean, while logging each contributing check on its own line.
//!
//! Only these fail a section: header not displayed, container not displayed,
//! zero items, or a label that is blank after trimming or cannot be read
//! even after re-resolving it. Count mismatches
//! between labels, icons and panels are logged as warnings and kept in the
//! report.

use crate::driver::{count_of, resolve_all, resolve_first, DriverResult, ElementHandle, UiDriver};
use crate::locator::Locator;
use crate::wait::Waiter;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Locators describing one section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpec {
    /// Name used in logs
    pub name: String,
    /// Section header
    pub header: Locator,
    /// Element wrapping the items
    pub container: Locator,
    /// Repeating items
    pub items: Locator,
    /// Label of each item; the item's own text when `None`
    pub labels: Option<Locator>,
    /// Icon of each item
    pub icons: Option<Locator>,
    /// Content panel of each item
    pub contents: Option<Locator>,
}

impl SectionSpec {
    /// Section with header, container and items only
    pub fn new(
        name: impl Into<String>,
        header: Locator,
        container: Locator,
        items: Locator,
    ) -> Self {
        Self {
            name: name.into(),
            header,
            container,
            items,
            labels: None,
            icons: None,
            contents: None,
        }
    }

    /// Use a dedicated label locator
    #[must_use]
    pub fn with_labels(mut self, labels: Locator) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Cross-check an icon per item
    #[must_use]
    pub fn with_icons(mut self, icons: Locator) -> Self {
        self.icons = Some(icons);
        self
    }

    /// Cross-check a content panel per item
    #[must_use]
    pub fn with_contents(mut self, contents: Locator) -> Self {
        self.contents = Some(contents);
        self
    }
}

/// Everything observed while verifying a section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    /// Section name
    pub name: String,
    /// Header became visible
    pub header_displayed: bool,
    /// Container became visible
    pub container_displayed: bool,
    /// Number of items
    pub item_count: usize,
    /// Number of labels read
    pub label_count: usize,
    /// Number of icons, when checked
    pub icon_count: Option<usize>,
    /// Number of content panels, when checked
    pub content_count: Option<usize>,
    /// Zero-based indices of blank labels
    pub blank_labels: Vec<usize>,
    /// Zero-based indices of labels whose text could not be read
    pub unreadable_labels: Vec<usize>,
    /// The label locator itself failed to resolve
    pub label_error: Option<String>,
    /// Logged, non-fatal count mismatches
    pub warnings: Vec<String>,
}

impl SectionReport {
    /// Single pass/fail decision
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.header_displayed
            && self.container_displayed
            && self.item_count > 0
            && self.blank_labels.is_empty()
            && self.unreadable_labels.is_empty()
            && self.label_error.is_none()
    }

    /// Human-readable reasons for failure
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.header_displayed {
            out.push(format!("{}: header not displayed", self.name));
        }
        if !self.container_displayed {
            out.push(format!("{}: container not displayed", self.name));
        }
        if self.item_count == 0 {
            out.push(format!("{}: no items found", self.name));
        }
        if let Some(e) = &self.label_error {
            out.push(format!("{}: labels could not be resolved ({e})", self.name));
        }
        for i in &self.blank_labels {
            out.push(format!("{}: label #{} is blank", self.name, i + 1));
        }
        for i in &self.unreadable_labels {
            out.push(format!("{}: label #{} could not be read", self.name, i + 1));
        }
        out
    }
}

/// Verify a section and return the full report
pub fn inspect_section<D: UiDriver + ?Sized>(
    waiter: &Waiter<'_, D>,
    spec: &SectionSpec,
) -> SectionReport {
    let driver = waiter.driver();
    let name = spec.name.as_str();
    info!(section = name, "validating section structure");

    let mut report = SectionReport {
        name: spec.name.clone(),
        ..SectionReport::default()
    };

    report.header_displayed = match waiter.wait_for_visibility(&spec.header) {
        Ok(_) => true,
        Err(e) => {
            error!(
                section = name,
                locator = %spec.header,
                error = %e,
                "header is not displayed"
            );
            false
        }
    };
    report.container_displayed = match waiter.wait_for_visibility(&spec.container) {
        Ok(_) => true,
        Err(e) => {
            error!(
                section = name,
                locator = %spec.container,
                error = %e,
                "container is not displayed"
            );
            false
        }
    };

    report.item_count = count_of(driver, &spec.items);
    if report.item_count == 0 {
        error!(section = name, locator = %spec.items, "no items found");
    }

    let label_locator = spec.labels.as_ref().unwrap_or(&spec.items);
    let labels = match resolve_all(driver, label_locator) {
        Ok(labels) => labels,
        Err(e) => {
            error!(
                section = name,
                locator = %label_locator,
                error = %e,
                "labels could not be resolved"
            );
            report.label_error = Some(e.to_string());
            Vec::new()
        }
    };
    report.label_count = labels.len();
    for (i, el) in labels.iter().enumerate() {
        match read_label(driver, label_locator, i, el) {
            Ok(text) if text.trim().is_empty() => {
                warn!(section = name, index = i + 1, "label is empty or blank");
                report.blank_labels.push(i);
            }
            Ok(_) => {}
            Err(e) => {
                error!(section = name, index = i + 1, error = %e, "label could not be read");
                report.unreadable_labels.push(i);
            }
        }
    }
    if !report.blank_labels.is_empty() {
        warn!(section = name, blanks = report.blank_labels.len(), "found blank labels");
    }

    report.icon_count = spec.icons.as_ref().map(|l| count_of(driver, l));
    report.content_count = spec.contents.as_ref().map(|l| count_of(driver, l));

    let items = report.item_count;
    let mut mismatch = |what: &str, count: usize| {
        if count != items {
            warn!(section = name, what, count, items, "count differs from item count");
            report.warnings.push(format!("{what} count ({count}) != item count ({items})"));
        }
    };
    mismatch("label", report.label_count);
    if let Some(icons) = report.icon_count {
        mismatch("icon", icons);
    }
    if let Some(contents) = report.content_count {
        mismatch("content", contents);
    }

    info!(
        section = name,
        header_displayed = report.header_displayed,
        container_displayed = report.container_displayed,
        items = report.item_count,
        labels = report.label_count,
        icons = ?report.icon_count,
        contents = ?report.content_count,
        "section summary"
    );
    if report.is_ok() {
        info!(section = name, "section structure OK");
    } else {
        error!(
            section = name,
            failures = ?report.failures(),
            "section structure validation failed"
        );
    }
    report
}

/// Text of label `index`; a transient failure re-resolves it once by position
fn read_label<D: UiDriver + ?Sized>(
    driver: &D,
    labels: &Locator,
    index: usize,
    element: &ElementHandle,
) -> DriverResult<String> {
    match driver.text(element) {
        Err(e) if e.is_transient() => {
            debug!(index = index + 1, error = %e, "label read failed; re-resolving");
            let fresh = resolve_first(driver, &labels.clone().nth(index))?;
            driver.text(&fresh)
        }
        other => other,
    }
}

/// Verify a section; `true` when it is rendered and usable
pub fn verify_section<D: UiDriver + ?Sized>(waiter: &Waiter<'_, D>, spec: &SectionSpec) -> bool {
    inspect_section(waiter, spec).is_ok()
}
