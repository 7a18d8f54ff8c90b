//! Page object trait and the context every page carries.

use crate::config::Settings;
use crate::driver::{resolve_all, UiDriver};
use crate::interaction::{safe_click, ClickTarget};
use crate::locator::Locator;
use crate::result::{PomError, PomResult};
use crate::timing::{LoadKind, LoadReport, LoadTimer};
use crate::wait::{is_element_displayed, Waiter};
use std::fmt;
use tracing::{debug, warn};

/// A page or component of the application under test.
///
/// # Example
///
/// ```
/// use pomkit::pages::{FaqsPage, PageContext, PageObject};
/// use pomkit::{MockDriver, Settings};
///
/// let driver = MockDriver::at("https://app.example.com/grc/faqs");
/// let faqs = FaqsPage::new(PageContext::new(&driver, Settings::default()));
/// assert_eq!(faqs.page_name(), "FAQs");
/// assert!(faqs.is_at("https://app.example.com/grc/faqs"));
/// ```
pub trait PageObject {
    /// Name used in logs and errors
    fn page_name(&self) -> &'static str;

    /// URL fragments identifying this page; empty when the URL is not checked
    fn url_fragments(&self) -> &'static [&'static str] {
        &[]
    }

    /// Which load thresholds apply when timing this page
    fn load_kind(&self) -> LoadKind {
        LoadKind::Navigation
    }

    /// Whether `url` belongs to this page
    fn is_at(&self, url: &str) -> bool {
        let fragments = self.url_fragments();
        fragments.is_empty() || fragments.iter().any(|f| url.contains(f))
    }

    /// Instant check that the page's landmark elements are displayed
    fn is_loaded(&self) -> bool;

    /// Wait, within the configured explicit wait, for the page to be ready
    fn wait_until_loaded(&self) -> bool;
}

/// Driver, waiter and settings shared by the methods of one page
pub struct PageContext<'d, D: UiDriver + ?Sized> {
    waiter: Waiter<'d, D>,
    settings: Settings,
}

impl<'d, D: UiDriver + ?Sized> PageContext<'d, D> {
    /// Context polling with the timeouts from `settings`
    pub fn new(driver: &'d D, settings: Settings) -> Self {
        Self {
            waiter: Waiter::with_options(driver, settings.wait_options()),
            settings,
        }
    }

    /// Underlying driver
    pub const fn driver(&self) -> &'d D {
        self.waiter.driver()
    }

    /// Waiter using the configured explicit wait
    pub const fn waiter(&self) -> &Waiter<'d, D> {
        &self.waiter
    }

    /// Runtime settings
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// [`safe_click`] with the configured click timeout
    pub fn click<'a>(&self, target: impl Into<ClickTarget<'a>>, label: &str) -> PomResult<()> {
        safe_click(&self.waiter, target, label, self.settings.click_timeout_secs)
    }

    /// [`safe_click`] with an explicit timeout in seconds
    pub fn click_within<'a>(
        &self,
        target: impl Into<ClickTarget<'a>>,
        label: &str,
        timeout_secs: u64,
    ) -> PomResult<()> {
        safe_click(&self.waiter, target, label, timeout_secs)
    }

    /// Whether the locator's first element is displayed right now
    pub fn is_displayed(&self, locator: &Locator) -> bool {
        is_element_displayed(self.driver(), locator)
    }

    /// Wait for visibility and log the outcome; `what` names the element
    pub fn is_visible(&self, locator: &Locator, what: &str) -> bool {
        match self.waiter.wait_for_visibility(locator) {
            Ok(_) => {
                debug!(element = what, "visible");
                true
            }
            Err(e) if e.is_timeout() => {
                warn!(element = what, error = %e, "not visible within timeout");
                false
            }
            Err(e) => {
                warn!(element = what, error = %e, "visibility check failed");
                false
            }
        }
    }

    /// Wait for visibility and return the trimmed text
    pub fn visible_text(&self, locator: &Locator) -> PomResult<String> {
        let element = self.waiter.wait_for_visibility(locator)?;
        Ok(self.driver().text(&element)?.trim().to_string())
    }

    /// Trimmed text of every displayed match, in document order
    pub fn displayed_texts(&self, locator: &Locator) -> Vec<String> {
        let driver = self.driver();
        let Ok(elements) = resolve_all(driver, locator) else {
            return Vec::new();
        };
        elements
            .iter()
            .filter_map(|el| match driver.is_displayed(el) {
                Ok(true) => Some(driver.text(el).map(|t| t.trim().to_string()).unwrap_or_default()),
                _ => None,
            })
            .collect()
    }

    /// Time `page` becoming ready against the configured thresholds
    pub fn time_load<P: PageObject + ?Sized>(&self, page: &P) -> PomResult<LoadReport> {
        let kind = page.load_kind();
        let thresholds = self.settings.thresholds(kind);
        let timer = LoadTimer::with_thresholds(kind, page.page_name(), thresholds);
        if !page.wait_until_loaded() {
            return Err(PomError::validation(
                page.page_name(),
                "page did not finish loading",
            ));
        }
        timer.finish().into_result()
    }
}

impl<D: UiDriver + ?Sized> Clone for PageContext<'_, D> {
    fn clone(&self) -> Self {
        Self {
            waiter: self.waiter,
            settings: self.settings.clone(),
        }
    }
}

impl<D: UiDriver + ?Sized> fmt::Debug for PageContext<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("wait", &self.waiter.options())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::Selector;
    use crate::mock::{MockDriver, MockElement};

    struct Landing<'d> {
        ctx: PageContext<'d, MockDriver>,
        header: Locator,
    }

    impl PageObject for Landing<'_> {
        fn page_name(&self) -> &'static str {
            "Landing"
        }

        fn url_fragments(&self) -> &'static [&'static str] {
            &["/home", "/landing"]
        }

        fn is_loaded(&self) -> bool {
            self.ctx.is_displayed(&self.header)
        }

        fn wait_until_loaded(&self) -> bool {
            self.ctx.is_visible(&self.header, "landing header")
        }
    }

    fn settings() -> Settings {
        Settings {
            explicit_wait_ms: 30,
            poll_interval_ms: 5,
            ..Settings::default()
        }
    }

    #[test]
    fn test_is_at_matches_any_fragment() {
        let driver = MockDriver::new();
        let page = Landing {
            ctx: PageContext::new(&driver, settings()),
            header: Locator::css("h1"),
        };
        assert!(page.is_at("https://x.test/landing?tab=1"));
        assert!(!page.is_at("https://x.test/login"));
    }

    #[test]
    fn test_time_load() {
        let driver = MockDriver::new();
        driver.add(MockElement::new("h1").matching(Selector::css("h1")).text("Hi"));
        let page = Landing {
            ctx: PageContext::new(&driver, settings()),
            header: Locator::css("h1"),
        };
        assert!(page.is_loaded());
        let report = page.ctx.time_load(&page).unwrap();
        assert_eq!(report.kind, LoadKind::Navigation);
        assert_eq!(page.ctx.visible_text(&Locator::css("h1")).unwrap(), "Hi");
    }

    #[test]
    fn test_time_load_fails_when_never_ready() {
        let driver = MockDriver::new();
        let page = Landing {
            ctx: PageContext::new(&driver, settings()),
            header: Locator::css("h1"),
        };
        let err = page.ctx.time_load(&page).unwrap_err();
        assert!(err.to_string().contains("Landing"));
    }

    #[test]
    fn test_displayed_texts_skips_hidden() {
        let driver = MockDriver::new();
        driver.add(MockElement::new("li").matching(Selector::css("li")).text(" a "));
        driver.add(MockElement::new("li").matching(Selector::css("li")).text("b").hidden());
        driver.add(MockElement::new("li").matching(Selector::css("li")).text("c"));
        let ctx = PageContext::new(&driver, settings());
        assert_eq!(ctx.displayed_texts(&Locator::css("li")), vec!["a", "c"]);
    }
}
