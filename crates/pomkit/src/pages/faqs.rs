//! FAQs: topic tiles, a topic view per tile and its question accordion.

use super::base::{PageContext, PageObject};
use crate::accordion::{Accordion, IconState, ToggleFailures, ToggleOutcome};
use crate::compare::verify_sequence;
use crate::driver::{count_of, resolve_all, resolve_first, UiDriver};
use crate::interaction::{normalize_text, ClickTarget};
use crate::locator::{xpath_literal, Locator};
use crate::result::{PomError, PomResult};
use crate::verify::{verify_section, SectionSpec};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const FAQS_HEADER: &str = "Choose the topic where you need help";
const HEADINGS: &str = "*[self::h1 or self::h2 or self::h3 or self::h4 or self::h5 or self::h6]";

/// Locators of the FAQs screens.
///
/// `question_title`, `toggle`, `icon` and `content` are relative to one
/// accordion item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqsLocators {
    /// Side-menu entry
    pub faqs_menu: Locator,
    /// Landing header
    pub header: Locator,
    /// Wrapper around the topic tiles
    pub topics_wrapper: Locator,
    /// Topic tile labels
    pub topic_labels: Locator,
    /// Header of the Compliance Calendar topic view
    pub compliance_header: Locator,
    /// Accordion wrapper in a topic view
    pub accordion_container: Locator,
    /// Accordion items
    pub accordion_items: Locator,
    /// Question text
    pub question_title: Locator,
    /// Clickable toggle row
    pub toggle: Locator,
    /// Plus/minus icon
    pub icon: Locator,
    /// Answer panel
    pub content: Locator,
    /// Back link
    pub back: Locator,
}

impl Default for FaqsLocators {
    fn default() -> Self {
        Self {
            faqs_menu: Locator::xpath_text_equals("p", "FAQs"),
            header: Locator::xpath_text_equals("h4", FAQS_HEADER),
            topics_wrapper: Locator::xpath("//div[contains(@class,'faqContainer')]"),
            topic_labels: Locator::xpath("//div[contains(@class,'faqItem')]//p"),
            compliance_header: Locator::xpath_text_equals("h4", "Compliance Calendar"),
            accordion_container: Locator::xpath("//div[contains(@class,'accordionContainer')]"),
            accordion_items: Locator::xpath(
                "//div[contains(@class,'accordionContainer')]//div[contains(@class,'accordion')]",
            ),
            question_title: Locator::xpath(".//div[contains(@class,'toggle')]//p"),
            toggle: Locator::xpath(".//div[contains(@class,'toggle')]"),
            icon: Locator::xpath(".//div[contains(@class,'toggle')]//img"),
            content: Locator::xpath(".//div[contains(@class,'content')]"),
            back: Locator::xpath(concat!(
                "(//a[normalize-space()='Back'] | //button[normalize-space()='Back']",
                " | //span[normalize-space()='Back'])[1]",
            )),
        }
    }
}

/// FAQs landing page and topic views
#[derive(Debug, Clone)]
pub struct FaqsPage<'d, D: UiDriver + ?Sized> {
    ctx: PageContext<'d, D>,
    loc: FaqsLocators,
}

impl<'d, D: UiDriver + ?Sized> FaqsPage<'d, D> {
    /// Page with the default locators
    pub fn new(ctx: PageContext<'d, D>) -> Self {
        Self::with_locators(ctx, FaqsLocators::default())
    }

    /// Page with custom locators
    pub fn with_locators(ctx: PageContext<'d, D>, loc: FaqsLocators) -> Self {
        Self { ctx, loc }
    }

    /// Locators in use
    pub fn locators(&self) -> &FaqsLocators {
        &self.loc
    }

    /// Open the FAQs from the side menu
    pub fn click_faqs_menu(&self) -> PomResult<()> {
        info!("clicking FAQs menu");
        self.ctx.click_within(&self.loc.faqs_menu, "FAQs", 10).inspect_err(|e| {
            error!(error = %e, "failed to click FAQs menu");
        })
    }

    /// Wait for the landing header; a text mismatch is only a warning
    pub fn wait_until_loaded_within(&self, timeout: Duration) -> bool {
        let waiter = self.ctx.waiter();
        match waiter.wait_for_visibility_custom_timeout(&self.loc.header, timeout) {
            Ok(header) => {
                let actual = normalize_text(&waiter.driver().text(&header).unwrap_or_default());
                if actual == FAQS_HEADER {
                    info!("FAQs header text matches");
                } else {
                    warn!(expected = FAQS_HEADER, actual = %actual, "FAQs header text mismatch");
                }
                true
            }
            Err(e) => {
                error!(
                    timeout_ms = timeout.as_millis() as u64,
                    error = %e,
                    "FAQs header did not appear"
                );
                false
            }
        }
    }

    /// Header, wrapper and every topic label visible, with at least one topic
    pub fn wait_for_topics(&self) -> bool {
        let waiter = self.ctx.waiter();
        let ready = waiter
            .wait_for_visibility(&self.loc.header)
            .and_then(|_| waiter.wait_for_visibility(&self.loc.topics_wrapper))
            .and_then(|_| waiter.wait_for_visibility_of_all(&self.loc.topic_labels));
        match ready {
            Ok(_) => self.topic_count() > 0,
            Err(e) => {
                warn!(error = %e, "FAQ topics list not ready");
                false
            }
        }
    }

    /// Displayed topic labels with non-blank text
    pub fn topic_count(&self) -> usize {
        self.ctx
            .displayed_texts(&self.loc.topic_labels)
            .iter()
            .filter(|t| !t.is_empty())
            .count()
    }

    /// Trimmed titles of the displayed topics, in order
    pub fn topic_titles(&self) -> Vec<String> {
        self.ctx.displayed_texts(&self.loc.topic_labels)
    }

    /// Raise [`PomError::Validation`] unless the topics match `expected` exactly
    pub fn verify_topics<S: AsRef<str>>(&self, expected: &[S]) -> PomResult<()> {
        let actual = self.topic_titles();
        info!(expected = expected.len(), actual = actual.len(), "verifying FAQ topics");
        verify_sequence("FAQ topics", expected, &actual)
    }

    fn compliance_section(&self) -> SectionSpec {
        let items = &self.loc.accordion_items;
        SectionSpec::new(
            "Compliance Calendar",
            self.loc.compliance_header.clone(),
            self.loc.accordion_container.clone(),
            items.clone(),
        )
        .with_labels(items.clone().child(&self.loc.question_title))
        .with_icons(items.clone().child(&self.loc.icon))
    }

    /// Structural check of the Compliance Calendar topic view
    pub fn is_compliance_header_visible(&self) -> bool {
        verify_section(self.ctx.waiter(), &self.compliance_section())
    }

    /// Click the topic tile whose text is exactly `name`.
    ///
    /// Fails with [`PomError::NotFound`] listing the visible topics when no
    /// tile matches.
    pub fn click_topic_by_name(&self, name: &str, timeout_secs: u64) -> PomResult<()> {
        info!(topic = name, "clicking FAQ topic");
        if !self.wait_for_topics() {
            error!(topic = name, "FAQ topics list is not visible");
            return Err(PomError::validation("FAQ topics", "topics list not visible"));
        }
        let visible = self.topic_titles();
        info!(count = visible.len(), topics = ?visible, "visible topics");

        let driver = self.ctx.driver();
        let label = format!("FAQ Topic: {name}");
        let labels = resolve_all(driver, &self.loc.topic_labels)?;
        let wanted = normalize_text(name);
        let position = labels.iter().position(|el| {
            matches!(driver.is_displayed(el), Ok(true))
                && driver.text(el).is_ok_and(|t| normalize_text(&t) == wanted)
        });

        if let Some(index) = position {
            info!(topic = name, position = index + 1, "found topic");
            let recover = self.loc.topic_labels.clone().nth(index);
            return self.ctx.click_within(
                ClickTarget::handle_with_locator(&labels[index], &recover),
                &label,
                timeout_secs,
            );
        }

        let fallback = Locator::xpath(format!(
            "//div[contains(@class,'faqItem')]//p[normalize-space()={}]",
            xpath_literal(name)
        ));
        warn!(topic = name, "falling back to text locator");
        if resolve_first(driver, &fallback).is_err() {
            error!(topic = name, visible = ?visible, "topic not found");
            return Err(PomError::NotFound {
                what: format!("FAQ topic '{name}'"),
                visible,
            });
        }
        self.ctx.click_within(&fallback, &label, timeout_secs)
    }

    /// Wait for a topic view headed `name`: exact `h4`, then any exact
    /// heading, then any heading containing the name; the accordion
    /// container must be displayed too
    pub fn wait_for_topic_header(&self, name: &str, timeout: Duration) -> bool {
        let literal = xpath_literal(name);
        let candidates = [
            Locator::xpath_text_equals("h4", name),
            Locator::xpath(format!("//{HEADINGS}[normalize-space()={literal}]")),
            Locator::xpath(format!("//{HEADINGS}[contains(normalize-space(.),{literal})]")),
        ];
        let container = &self.loc.accordion_container;
        let description = format!("topic header '{name}'");

        self.ctx
            .waiter()
            .wait_until_true(&description, timeout, |d| {
                for (i, candidate) in candidates.iter().enumerate() {
                    match resolve_first(d, candidate) {
                        Ok(header) => {
                            if i == 2 {
                                debug!(topic = name, "matched header by contains()");
                            }
                            let container_shown = resolve_first(d, container)
                                .and_then(|c| d.is_displayed(&c))
                                .unwrap_or(false);
                            return Ok(d.is_displayed(&header)? && container_shown);
                        }
                        Err(e) if e.is_transient() => continue,
                        Err(e) => return Err(e),
                    }
                }
                Ok(false)
            })
            .is_ok()
    }

    /// Topic view for `name` is shown; a sparse structure is only logged
    pub fn is_topic_header_visible(&self, name: &str) -> bool {
        if !self.wait_for_topic_header(name, Duration::from_secs(8)) {
            error!(topic = name, "topic header not visible within timeout");
            return false;
        }
        let driver = self.ctx.driver();
        let items_loc = &self.loc.accordion_items;
        let items = count_of(driver, items_loc);
        let titles = count_of(driver, &items_loc.clone().child(&self.loc.question_title));
        let icons = count_of(driver, &items_loc.clone().child(&self.loc.icon));
        info!(topic = name, items, titles, icons, "topic structure");
        if items == 0 || titles == 0 || icons == 0 {
            warn!(topic = name, items, titles, icons, "topic structure looks light");
        }
        true
    }

    /// The topic view's accordion
    pub fn accordion(&self) -> Accordion {
        Accordion::new(
            self.loc.accordion_items.clone(),
            self.loc.question_title.clone(),
            self.loc.toggle.clone(),
            self.loc.icon.clone(),
            self.loc.content.clone(),
        )
        .with_attempts(self.ctx.settings().toggle_attempts)
        .with_click_timeout(8)
    }

    /// Question titles, blank ones included as empty strings
    pub fn question_titles(&self) -> Vec<String> {
        self.accordion().titles(self.ctx.waiter())
    }

    /// Expand every question
    pub fn expand_all(&self) -> Result<ToggleOutcome, ToggleFailures> {
        self.accordion().expand_all(self.ctx.waiter())
    }

    /// Collapse every question
    pub fn collapse_all(&self) -> Result<ToggleOutcome, ToggleFailures> {
        self.accordion().collapse_all(self.ctx.waiter())
    }

    /// Icon state per question
    pub fn icon_states(&self) -> Vec<IconState> {
        self.accordion().icon_states(self.ctx.waiter())
    }

    /// Per question: answer displayed with non-blank text
    pub fn contents_visible_and_non_empty(&self) -> Vec<bool> {
        self.accordion().contents_visible_and_non_empty(self.ctx.waiter())
    }

    /// Leave the topic view
    pub fn click_back(&self) -> PomResult<()> {
        self.ctx.click_within(&self.loc.back, "Back", 6)
    }
}

impl<D: UiDriver + ?Sized> PageObject for FaqsPage<'_, D> {
    fn page_name(&self) -> &'static str {
        "FAQs"
    }

    fn url_fragments(&self) -> &'static [&'static str] {
        &["/faqs", "/faq"]
    }

    fn is_loaded(&self) -> bool {
        self.ctx.is_displayed(&self.loc.header)
    }

    fn wait_until_loaded(&self) -> bool {
        self.wait_until_loaded_within(self.ctx.settings().explicit_wait())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::accordion::ToggleState;
    use crate::config::Settings;
    use crate::mock::{ClickAction, MockDriver, MockElement, NodeId};

    fn settings() -> Settings {
        Settings {
            explicit_wait_ms: 40,
            poll_interval_ms: 2,
            click_timeout_secs: 1,
            ..Settings::default()
        }
    }

    fn landing(driver: &MockDriver, topics: &[&str]) -> Vec<NodeId> {
        let loc = FaqsLocators::default();
        driver.add(MockElement::new("h4").matching_locator(&loc.header).text(FAQS_HEADER));
        let wrapper = driver.add(MockElement::new("div").matching_locator(&loc.topics_wrapper));
        topics
            .iter()
            .map(|t| {
                let tile = driver.add_child(wrapper, MockElement::new("div"));
                let label = MockElement::new("p").matching_locator(&loc.topic_labels).text(*t);
                driver.add_child(tile, label)
            })
            .collect()
    }

    /// Topic view with one accordion item per `(question, expanded)`
    fn topic_view(driver: &MockDriver, header: &str, questions: &[(&str, bool)]) -> NodeId {
        let loc = FaqsLocators::default();
        driver.add(
            MockElement::new("h4")
                .matching_locator(&Locator::xpath_text_equals("h4", header))
                .text(header),
        );
        let container =
            driver.add(MockElement::new("div").matching_locator(&loc.accordion_container));
        for (question, expanded) in questions {
            let item = driver.add_child(
                container,
                MockElement::new("div").matching_locator(&loc.accordion_items),
            );
            let toggle =
                driver.add_child(item, MockElement::new("div").matching_locator(&loc.toggle));
            driver.add_child(
                toggle,
                MockElement::new("p")
                    .matching_locator(&loc.question_title)
                    .text(*question),
            );
            let src = if *expanded { "/assets/minus.svg" } else { "/assets/plus.svg" };
            let icon = driver.add_child(
                toggle,
                MockElement::new("img")
                    .matching_locator(&loc.icon)
                    .attr("src", src),
            );
            let mut content = MockElement::new("div")
                .matching_locator(&loc.content)
                .text(format!("About {question}"));
            if !expanded {
                content = content.hidden();
            }
            let content = driver.add_child(item, content);
            driver.on_click(toggle, ClickAction::ToggleAccordion { content, icon });
        }
        container
    }

    mod topics_tests {
        use super::*;

        #[test]
        fn test_topic_titles_in_order() {
            let driver = MockDriver::new();
            landing(&driver, &["Compliance", "GST", "Payroll"]);
            let page = FaqsPage::new(PageContext::new(&driver, settings()));
            assert!(page.wait_until_loaded());
            assert!(page.wait_for_topics());
            assert_eq!(page.topic_count(), 3);
            assert_eq!(page.topic_titles(), vec!["Compliance", "GST", "Payroll"]);
            assert!(page.verify_topics(&["Compliance", "GST", "Payroll"]).is_ok());
        }

        #[test]
        fn test_click_topic_by_name_clicks_second_tile() {
            let driver = MockDriver::new();
            let tiles = landing(&driver, &["Compliance", "GST", "Payroll"]);
            let page = FaqsPage::new(PageContext::new(&driver, settings()));
            page.click_topic_by_name("GST", 1).unwrap();
            assert_eq!(driver.click_count(tiles[1]), 1);
            assert_eq!(driver.click_count(tiles[0]), 0);
            assert_eq!(driver.click_count(tiles[2]), 0);
        }

        #[test]
        fn test_click_topic_ignores_non_breaking_spaces() {
            let driver = MockDriver::new();
            let tiles = landing(&driver, &["Compliance", "Payroll\u{00A0}Services"]);
            let page = FaqsPage::new(PageContext::new(&driver, settings()));
            page.click_topic_by_name("Payroll Services", 1).unwrap();
            assert_eq!(driver.click_count(tiles[1]), 1);
        }

        #[test]
        fn test_unknown_topic_reports_visible_ones() {
            let driver = MockDriver::new();
            landing(&driver, &["Compliance", "GST"]);
            let page = FaqsPage::new(PageContext::new(&driver, settings()));
            match page.click_topic_by_name("Payroll", 1).unwrap_err() {
                PomError::NotFound { what, visible } => {
                    assert!(what.contains("Payroll"));
                    assert_eq!(visible, vec!["Compliance", "GST"]);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_order_mismatch_is_a_validation_error() {
            let driver = MockDriver::new();
            landing(&driver, &["GST", "Compliance"]);
            let page = FaqsPage::new(PageContext::new(&driver, settings()));
            let err = page.verify_topics(&["Compliance", "GST"]).unwrap_err();
            assert!(matches!(err, PomError::Validation { .. }));
        }

        #[test]
        fn test_menu_click() {
            let driver = MockDriver::new();
            let loc = FaqsLocators::default();
            let menu =
                driver.add(MockElement::new("p").matching_locator(&loc.faqs_menu).text("FAQs"));
            let page = FaqsPage::new(PageContext::new(&driver, settings()));
            page.click_faqs_menu().unwrap();
            assert_eq!(driver.click_count(menu), 1);
            assert!(!page.is_loaded());
        }
    }

    mod topic_view_tests {
        use super::*;

        #[test]
        fn test_compliance_structure() {
            let driver = MockDriver::new();
            let questions = [("Q1", false), ("Q2", true), ("Q3", false)];
            topic_view(&driver, "Compliance Calendar", &questions);
            let page = FaqsPage::new(PageContext::new(&driver, settings()));
            assert!(page.is_compliance_header_visible());
            assert!(page.is_topic_header_visible("Compliance Calendar"));
            assert_eq!(page.question_titles(), vec!["Q1", "Q2", "Q3"]);
            assert_eq!(
                page.icon_states(),
                vec![IconState::Plus, IconState::Minus, IconState::Plus]
            );
            assert_eq!(page.accordion().item_state(page.ctx.waiter(), 1), ToggleState::Expanded);
        }

        #[test]
        fn test_empty_topic_fails_structure_without_error() {
            let driver = MockDriver::new();
            topic_view(&driver, "Compliance Calendar", &[]);
            let page = FaqsPage::new(PageContext::new(&driver, settings()));
            assert!(!page.is_compliance_header_visible());
        }

        #[test]
        fn test_expand_then_collapse_all() {
            let driver = MockDriver::new();
            topic_view(&driver, "GST", &[("Q1", false), ("Q2", true)]);
            let page = FaqsPage::new(PageContext::new(&driver, settings()));
            let expanded = page.expand_all().unwrap();
            assert_eq!(expanded.items[1].clicks, 0);
            assert_eq!(page.contents_visible_and_non_empty(), vec![true, true]);
            page.collapse_all().unwrap();
            assert_eq!(page.icon_states(), vec![IconState::Plus, IconState::Plus]);
            assert_eq!(page.contents_visible_and_non_empty(), vec![false, false]);
        }

        #[test]
        fn test_missing_topic_header() {
            let driver = MockDriver::new();
            topic_view(&driver, "GST", &[("Q1", false)]);
            let page = FaqsPage::new(PageContext::new(&driver, settings()));
            assert!(!page.wait_for_topic_header("Payroll", Duration::from_millis(20)));
        }
    }
}
