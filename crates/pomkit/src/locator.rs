//! Locator abstraction for element selection.
//!
//! A [`Locator`] is the stable key of the page-object layer: it is declared
//! once per page and resolved against the live tree every time it is needed.
//! Element handles obtained from a resolution are never stored on a page.
//!
//! Locators are chains. Each step is resolved relative to the matches of the
//! previous step, and may pick a single match by position, so
//! `items >> nth=2 >> .icon` addresses the icon inside the third item.

use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Visible text selector (exact, whitespace-normalized match)
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Strategy name used in the display form
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::XPath(_) => "xpath",
            Self::Text(_) => "text",
            Self::TestId(_) => "testid",
        }
    }

    /// Raw selector expression
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) | Self::Text(s) | Self::TestId(s) => s,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.expression())
    }
}

/// One link of a locator chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocatorStep {
    /// Selector applied to the previous step's matches
    pub selector: Selector,
    /// Keep only the match at this position
    pub nth: Option<usize>,
}

/// Immutable description of zero or more elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    steps: Vec<LocatorStep>,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            steps: vec![LocatorStep {
                selector,
                nth: None,
            }],
        }
    }

    /// CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::css(selector))
    }

    /// XPath locator
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::from_selector(Selector::xpath(expr))
    }

    /// Exact text locator
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::text(text))
    }

    /// `data-testid` locator
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::from_selector(Selector::test_id(id))
    }

    /// `//tag[normalize-space()='text']` with safe quoting
    #[must_use]
    pub fn xpath_text_equals(tag: &str, text: &str) -> Self {
        Self::xpath(format!("//{tag}[normalize-space()={}]", xpath_literal(text)))
    }

    /// `//tag[contains(normalize-space(),'text')]` with safe quoting
    #[must_use]
    pub fn xpath_text_contains(tag: &str, text: &str) -> Self {
        Self::xpath(format!(
            "//{tag}[contains(normalize-space(),{})]",
            xpath_literal(text)
        ))
    }

    /// Narrow the last step to the match at `index`
    #[must_use]
    pub fn nth(mut self, index: usize) -> Self {
        if let Some(last) = self.steps.last_mut() {
            last.nth = Some(index);
        }
        self
    }

    /// Narrow the last step to its first match
    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Append another locator, resolved inside this one's matches
    #[must_use]
    pub fn child(mut self, inner: &Self) -> Self {
        self.steps.extend(inner.steps.iter().cloned());
        self
    }

    /// Steps of the chain, outermost first
    #[must_use]
    pub fn steps(&self) -> &[LocatorStep] {
        &self.steps
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            write!(f, "{}", step.selector)?;
            if let Some(n) = step.nth {
                write!(f, " >> nth={n}")?;
            }
        }
        Ok(())
    }
}

/// Quote a string as an XPath literal.
///
/// XPath 1.0 has no escape sequences, so a value containing both quote
/// characters is assembled with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
