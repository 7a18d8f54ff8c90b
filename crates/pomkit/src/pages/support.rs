//! Support page: "Report an issue" form and the support e-mail link.

use super::base::{PageContext, PageObject};
use crate::driver::{resolve_first, UiDriver};
use crate::interaction::{input_value, normalize_text, safe_type};
use crate::locator::{xpath_literal, Locator};
use crate::result::{PomError, PomResult};
use crate::test_data::TestDataGenerator;
use tracing::{error, info, warn};

/// Header texts accepted as "the support page is up"
pub const EXPECTED_HEADERS: [&str; 2] = ["Help", "Report an Issue"];

/// URL fragments of the support page across app versions
pub const URL_FRAGMENTS: [&str; 4] = [
    "/grc/profile/support",
    "/profile/support",
    "/support",
    "/report-issue",
];

const PAGE: &str = "Report an issue";

/// Locators of the support page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportLocators {
    /// Sidebar tab opening the page
    pub tab: Locator,
    /// Page header
    pub header: Locator,
    /// Module dropdown control
    pub dropdown: Locator,
    /// Open dropdown menu
    pub menu: Locator,
    /// Selected value shown in the closed dropdown
    pub selected_value: Locator,
    /// Every option of the open menu
    pub options: Locator,
    /// Feedback text area
    pub feedback: Locator,
    /// Send button
    pub send: Locator,
    /// Confirmation text after sending
    pub confirmation: Locator,
    /// Button closing the confirmation
    pub got_it: Locator,
    /// `mailto:` support link
    pub support_email: Locator,
}

impl SupportLocators {
    /// Option of the open menu whose text is exactly `name`
    pub fn module_option(&self, name: &str) -> Locator {
        Locator::xpath(format!(
            concat!(
                "//div[contains(@class,'-menu')]",
                "//div[contains(@class,'-option') and normalize-space()={}]",
            ),
            xpath_literal(name)
        ))
    }
}

impl Default for SupportLocators {
    fn default() -> Self {
        Self {
            tab: Locator::xpath_text_equals("p", "Report an issue"),
            header: Locator::xpath_text_equals("h2", "Help"),
            dropdown: Locator::css("div[class*='-control']"),
            menu: Locator::css("div[class*='-menu']"),
            selected_value: Locator::css("div[class*='-singleValue']"),
            options: Locator::xpath("//div[contains(@class,'option')]"),
            feedback: Locator::xpath("//textarea[@id='query']"),
            send: Locator::css("button.styles_sendBtn__Croyp"),
            confirmation: Locator::css("div.styles_report__1Kc21 p"),
            got_it: Locator::xpath_text_equals("button", "Got it"),
            support_email: Locator::xpath(
                "//a[normalize-space()='support@vakilsearch.com' and starts-with(@href,'mailto:')]",
            ),
        }
    }
}

fn header_matches(text: &str) -> bool {
    let text = normalize_text(text).to_lowercase();
    EXPECTED_HEADERS.iter().any(|h| {
        let h = h.to_lowercase();
        text == h || text.contains(&h)
    })
}

/// Support / report-an-issue page
#[derive(Debug, Clone)]
pub struct SupportPage<'d, D: UiDriver + ?Sized> {
    ctx: PageContext<'d, D>,
    loc: SupportLocators,
}

impl<'d, D: UiDriver + ?Sized> SupportPage<'d, D> {
    /// Page with the default locators
    pub fn new(ctx: PageContext<'d, D>) -> Self {
        Self::with_locators(ctx, SupportLocators::default())
    }

    /// Page with custom locators
    pub fn with_locators(ctx: PageContext<'d, D>, loc: SupportLocators) -> Self {
        Self { ctx, loc }
    }

    /// Locators in use
    pub fn locators(&self) -> &SupportLocators {
        &self.loc
    }

    /// Click the "Report an issue" tab
    pub fn open(&self) -> PomResult<()> {
        self.ctx.click(&self.loc.tab, "Report an issue tab")
    }

    /// Module names offered by the open menu
    pub fn module_options(&self) -> Vec<String> {
        let options = self.ctx.displayed_texts(&self.loc.options);
        info!(count = options.len(), "module options");
        options
    }

    /// Open the module menu unless it is already open
    pub fn open_modules_dropdown(&self) -> PomResult<()> {
        if self.ctx.is_displayed(&self.loc.menu) {
            return Ok(());
        }
        self.ctx.click(&self.loc.dropdown, "Modules dropdown")?;
        self.ctx.waiter().wait_for_visibility(&self.loc.menu)?;
        Ok(())
    }

    /// Pick `name` from the module dropdown and confirm the selection stuck
    pub fn select_module(&self, name: &str) -> PomResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PomError::validation(PAGE, "module name must not be empty"));
        }
        self.open_modules_dropdown()?;

        let option = self.loc.module_option(name);
        self.ctx.waiter().wait_for_visibility(&option)?;
        self.ctx.click(&option, &format!("module option '{name}'"))?;

        if let Err(e) = self.ctx.waiter().wait_for_invisibility(&self.loc.menu) {
            warn!(error = %e, "module menu still open after selection");
        }
        self.ctx
            .waiter()
            .wait_for_text_containing(&self.loc.selected_value, name)?;

        let selected = self.selected_module()?;
        if !selected.eq_ignore_ascii_case(name) {
            error!(expected = name, actual = %selected, "module selection mismatch");
            return Err(PomError::validation(
                PAGE,
                format!("selected module is '{selected}', expected '{name}'"),
            ));
        }
        info!(module = name, "module selected");
        Ok(())
    }

    /// Module currently shown in the dropdown
    pub fn selected_module(&self) -> PomResult<String> {
        self.ctx.visible_text(&self.loc.selected_value)
    }

    /// Type `text` into the feedback area and check it landed
    pub fn enter_feedback(&self, text: &str) -> PomResult<()> {
        let driver = self.ctx.driver();
        let area = self.ctx.waiter().wait_for_visibility(&self.loc.feedback)?;
        let tag = driver.tag_name(&area)?;
        if tag != "textarea" {
            return Err(PomError::validation(
                PAGE,
                format!("feedback field is a <{tag}>, expected <textarea>"),
            ));
        }
        safe_type(self.ctx.waiter(), &self.loc.feedback, text, "Feedback")?;

        let value = self.feedback_value()?;
        if value.trim().is_empty() {
            return Err(PomError::validation(PAGE, "feedback field is empty after typing"));
        }
        info!(chars = value.chars().count(), "feedback entered");
        Ok(())
    }

    /// Type a generated feedback message; returns what was typed
    pub fn enter_random_feedback(&self, gen: &mut TestDataGenerator) -> PomResult<String> {
        let message = gen.feedback_message();
        self.enter_feedback(&message)?;
        Ok(message)
    }

    /// Current content of the feedback area
    pub fn feedback_value(&self) -> PomResult<String> {
        input_value(self.ctx.driver(), &self.loc.feedback)
    }

    /// Send button is displayed and enabled
    pub fn is_send_enabled(&self) -> bool {
        let driver = self.ctx.driver();
        resolve_first(driver, &self.loc.send)
            .and_then(|el| Ok(driver.is_displayed(&el)? && driver.is_enabled(&el)?))
            .unwrap_or(false)
    }

    /// Submit the report
    pub fn click_send(&self) -> PomResult<()> {
        self.ctx.click(&self.loc.send, "Send")
    }

    /// Confirmation text must equal `expected` once both are trimmed
    pub fn verify_confirmation(&self, expected: &str) -> PomResult<()> {
        let expected = expected.trim();
        if expected.is_empty() {
            return Err(PomError::validation(PAGE, "expected confirmation text must not be empty"));
        }
        let actual = self.ctx.visible_text(&self.loc.confirmation)?;
        if actual.is_empty() {
            error!("confirmation message is empty");
            return Err(PomError::validation(PAGE, "confirmation message is empty"));
        }
        if actual != expected {
            error!(expected, actual = %actual, "confirmation mismatch");
            return Err(PomError::validation(
                PAGE,
                format!("confirmation mismatch: expected '{expected}', got '{actual}'"),
            ));
        }
        info!(message = %actual, "confirmation verified");
        Ok(())
    }

    /// Dismiss the confirmation dialog
    pub fn close_confirmation(&self) -> PomResult<()> {
        self.ctx.click(&self.loc.got_it, "Got it")?;
        if let Err(e) = self.ctx.waiter().wait_for_invisibility(&self.loc.got_it) {
            warn!(error = %e, "confirmation still displayed after Got it");
        }
        Ok(())
    }

    /// Visible text of the support e-mail link
    pub fn support_email_text(&self) -> PomResult<String> {
        self.ctx.visible_text(&self.loc.support_email)
    }

    /// `href` of the support e-mail link
    pub fn support_email_href(&self) -> PomResult<String> {
        let driver = self.ctx.driver();
        let link = self.ctx.waiter().wait_for_visibility(&self.loc.support_email)?;
        driver
            .attribute(&link, "href")?
            .ok_or_else(|| PomError::validation(PAGE, "support e-mail link has no href"))
    }

    /// Link text is `email` and its href is `mailto:<email>` (any case)
    pub fn verify_support_email(&self, email: &str) -> PomResult<()> {
        let email = email.trim();
        let text = self.support_email_text()?;
        if !text.eq_ignore_ascii_case(email) {
            return Err(PomError::validation(
                PAGE,
                format!("support e-mail text is '{text}', expected '{email}'"),
            ));
        }
        let href = self.support_email_href()?;
        let wanted = format!("mailto:{email}").to_lowercase();
        if !href.trim().to_lowercase().starts_with(&wanted) {
            return Err(PomError::validation(
                PAGE,
                format!("support e-mail href is '{href}', expected it to start with '{wanted}'"),
            ));
        }
        info!(email, "support e-mail link verified");
        Ok(())
    }

    /// Click the support e-mail link
    pub fn click_support_email(&self) -> PomResult<()> {
        self.ctx.click(&self.loc.support_email, "Support e-mail")
    }

    fn header_ok(&self) -> bool {
        match self.ctx.visible_text(&self.loc.header) {
            Ok(text) if header_matches(&text) => true,
            Ok(text) => {
                warn!(header = %text, expected = ?EXPECTED_HEADERS, "unexpected support header");
                false
            }
            Err(e) => {
                warn!(error = %e, "support header not visible");
                false
            }
        }
    }
}

impl<D: UiDriver + ?Sized> PageObject for SupportPage<'_, D> {
    fn page_name(&self) -> &'static str {
        PAGE
    }

    fn url_fragments(&self) -> &'static [&'static str] {
        &URL_FRAGMENTS
    }

    fn is_loaded(&self) -> bool {
        let url_ok = self
            .ctx
            .driver()
            .current_url()
            .map(|url| self.is_at(&url))
            .unwrap_or(false);
        url_ok && self.ctx.is_displayed(&self.loc.header)
    }

    /// Header text and URL must both match
    fn wait_until_loaded(&self) -> bool {
        let header_ok = self.header_ok();
        let url_ok = match self.ctx.waiter().wait_for_url_contains_any(&URL_FRAGMENTS) {
            Ok(url) => {
                info!(url = %url, "support URL confirmed");
                true
            }
            Err(e) => {
                warn!(error = %e, "support URL not reached");
                false
            }
        };
        info!(header_ok, url_ok, "support page load check");
        header_ok && url_ok
    }
}
