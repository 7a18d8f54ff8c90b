//! Sign-up form and the onboarding steps that follow it.

use super::base::{PageContext, PageObject};
use crate::driver::{resolve_first, UiDriver};
use crate::interaction::safe_type;
use crate::locator::{xpath_literal, Locator};
use crate::result::{PomError, PomResult};
use crate::test_data::{SignUpForm, TestDataGenerator};
use std::time::Duration;
use tracing::{error, info, warn};

const PAGE: &str = "Sign up";

/// URL fragment of the post-onboarding welcome page
pub const WELCOME_URL_FRAGMENT: &str = "/grc/welcome";

/// Locators of the sign-up form and onboarding steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpLocators {
    /// Link opening the form
    pub sign_up_link: Locator,
    /// "Create an account" header
    pub header: Locator,
    /// Looser header match for copy variants
    pub header_fallback: Locator,
    /// Form card
    pub container: Locator,
    /// Field labels inside the form card
    pub field_labels: Locator,
    /// Full name input
    pub full_name: Locator,
    /// E-mail input
    pub email: Locator,
    /// Phone input
    pub phone: Locator,
    /// Password input
    pub password: Locator,
    /// Password confirmation input, absent on some variants
    pub confirm_password: Locator,
    /// Submit button
    pub sign_up_button: Locator,
    /// Account-created toast
    pub success_message: Locator,
    /// Onboarding: full name label
    pub onboarding_name_label: Locator,
    /// Onboarding: full name input
    pub onboarding_name_input: Locator,
    /// Onboarding: designation label
    pub designation_label: Locator,
    /// Onboarding: designation select
    pub designation_select: Locator,
    /// Onboarding: text input of the designation select
    pub designation_input: Locator,
    /// Onboarding: Next button
    pub next: Locator,
    /// Welcome page: usage question
    pub welcome_question: Locator,
    /// Welcome page: "Business needs" choice
    pub business_needs: Locator,
    /// Welcome page: "Personal needs" choice
    pub personal_needs: Locator,
}

impl SignUpLocators {
    /// Option of the open designation menu whose text is exactly `name`
    pub fn designation_option(&self, name: &str) -> Locator {
        Locator::xpath(format!(
            "//div[contains(@class,'-option') and normalize-space()={}]",
            xpath_literal(name)
        ))
    }
}

impl Default for SignUpLocators {
    fn default() -> Self {
        Self {
            sign_up_link: Locator::xpath(
                "//a[normalize-space()='Sign Up' or normalize-space()='Signup']",
            ),
            header: Locator::xpath(
                "//h1[normalize-space()='Create an account' or normalize-space()='Create Account']",
            ),
            header_fallback: Locator::xpath("//h1[contains(normalize-space(.),'Create')]"),
            container: Locator::xpath(
                "(//div[contains(@class,'bg-white') and contains(@class,'shadow')])[3]",
            ),
            field_labels: Locator::xpath(
                "//div[contains(@class,'bg-white') and contains(@class,'shadow')]//label",
            ),
            full_name: Locator::xpath("//input[@id='name' or @name='name']"),
            email: Locator::xpath("//input[@type='email' or @name='email']"),
            phone: Locator::xpath(
                "//label[normalize-space()='Phone number']/ancestor::div[@class='relative']//input",
            ),
            password: Locator::xpath(
                "//input[@type='password' and not(contains(@name,'confirm'))]",
            ),
            confirm_password: Locator::xpath(
                "//input[@type='password' and contains(@name,'confirm')]",
            ),
            sign_up_button: Locator::xpath_text_equals("button", "Sign Up"),
            success_message: Locator::xpath(concat!(
                "//div[contains(@class,'toast') or contains(text(),'success')",
                " or contains(text(),'Account created')]",
            )),
            onboarding_name_label: Locator::xpath(
                "(//label[contains(normalize-space(),'Full Name')])[2]",
            ),
            onboarding_name_input: Locator::xpath(
                "(//div[@class='styles_grcInputField__gkWzp   ']//input[@type='text'])[3]",
            ),
            designation_label: Locator::xpath(
                "(//label[contains(normalize-space(),'Designation')])[2]",
            ),
            designation_select: Locator::xpath(concat!(
                "(//label[contains(normalize-space(),'Designation')]",
                "/following::input[starts-with(@id,'react-select')][1])[2]",
            )),
            designation_input: Locator::xpath("//input[@id='react-select-3-input']"),
            next: Locator::xpath("(//p[normalize-space()='Next'])[3]"),
            welcome_question: Locator::xpath(
                "(//label[contains(normalize-space(),'How do you plan to use Zolvit 360')])[2]",
            ),
            business_needs: Locator::xpath(
                "(//p[contains(normalize-space(),'Business needs')])[2]",
            ),
            personal_needs: Locator::xpath(
                "(//p[contains(normalize-space(),'Personal needs')])[2]",
            ),
        }
    }
}

/// Sign-up page and onboarding flow
#[derive(Debug, Clone)]
pub struct SignUpPage<'d, D: UiDriver + ?Sized> {
    ctx: PageContext<'d, D>,
    loc: SignUpLocators,
}

impl<'d, D: UiDriver + ?Sized> SignUpPage<'d, D> {
    /// Page with the default locators
    pub fn new(ctx: PageContext<'d, D>) -> Self {
        Self::with_locators(ctx, SignUpLocators::default())
    }

    /// Page with custom locators
    pub fn with_locators(ctx: PageContext<'d, D>, loc: SignUpLocators) -> Self {
        Self { ctx, loc }
    }

    /// Locators in use
    pub fn locators(&self) -> &SignUpLocators {
        &self.loc
    }

    /// Follow the "Sign Up" link
    pub fn open(&self) -> PomResult<()> {
        self.ctx.click(&self.loc.sign_up_link, "Sign Up link")
    }

    /// Header text, falling back to the looser header match
    pub fn header_text(&self) -> PomResult<String> {
        if self.ctx.is_displayed(&self.loc.header) {
            return self.ctx.visible_text(&self.loc.header);
        }
        self.ctx.visible_text(&self.loc.header_fallback)
    }

    /// Labels of the form fields, in document order
    pub fn form_field_labels(&self) -> Vec<String> {
        let labels = self.ctx.displayed_texts(&self.loc.field_labels);
        info!(labels = ?labels, "sign-up form labels");
        labels
    }

    /// Submit button is displayed and enabled
    pub fn is_sign_up_enabled(&self) -> bool {
        let driver = self.ctx.driver();
        resolve_first(driver, &self.loc.sign_up_button)
            .and_then(|el| Ok(driver.is_displayed(&el)? && driver.is_enabled(&el)?))
            .unwrap_or(false)
    }

    /// Type every field of `form`; the confirmation field is filled when present
    pub fn fill_form(&self, form: &SignUpForm) -> PomResult<()> {
        let waiter = self.ctx.waiter();
        safe_type(waiter, &self.loc.full_name, &form.full_name, "Full name")?;
        safe_type(waiter, &self.loc.email, &form.email, "Email")?;
        safe_type(waiter, &self.loc.phone, &form.phone, "Phone number")?;
        safe_type(waiter, &self.loc.password, &form.password, "Password")?;
        if self.ctx.is_displayed(&self.loc.confirm_password) {
            safe_type(waiter, &self.loc.confirm_password, &form.password, "Confirm password")?;
        }
        info!(email = %form.email, "sign-up form filled");
        Ok(())
    }

    /// Submit the form
    pub fn click_sign_up(&self) -> PomResult<()> {
        self.ctx.click(&self.loc.sign_up_button, "Sign Up")
    }

    /// Account-created toast appeared
    pub fn is_account_created_message_visible(&self) -> bool {
        self.ctx.is_visible(&self.loc.success_message, "account created message")
    }

    /// Onboarding full name step is up
    pub fn is_full_name_step_visible(&self) -> bool {
        self.ctx.is_visible(&self.loc.onboarding_name_label, "Full Name label")
            && self.ctx.is_visible(&self.loc.onboarding_name_input, "Full Name input")
    }

    /// Type `name` into the onboarding full name field
    pub fn enter_full_name(&self, name: &str) -> PomResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PomError::validation(PAGE, "full name must not be blank"));
        }
        safe_type(self.ctx.waiter(), &self.loc.onboarding_name_input, name, "Full Name")
    }

    /// Onboarding designation step is up
    pub fn is_designation_step_visible(&self) -> bool {
        self.ctx.is_visible(&self.loc.designation_label, "Designation label")
            && self.ctx.is_visible(&self.loc.designation_select, "Designation select")
    }

    /// Pick a random designation, then press Next; returns the designation
    pub fn choose_designation(&self, gen: &mut TestDataGenerator) -> PomResult<String> {
        let designation = gen.designation();
        self.ctx.click(&self.loc.designation_select, "Designation")?;
        safe_type(self.ctx.waiter(), &self.loc.designation_input, designation, "Designation")?;
        let option = self.loc.designation_option(designation);
        self.ctx.click(&option, &format!("designation '{designation}'"))?;
        self.ctx.click_within(&self.loc.next, "Next", 10)?;
        info!(designation, "designation chosen");
        Ok(designation.to_string())
    }

    /// URL reaches the welcome page within `timeout` and its three
    /// landmarks are displayed
    pub fn wait_for_welcome_page(&self, timeout: Duration) -> bool {
        let reached = self
            .ctx
            .waiter()
            .wait_until_true("welcome page URL", timeout, |d| {
                Ok(d.current_url()?.contains(WELCOME_URL_FRAGMENT))
            });
        if let Err(e) = reached {
            error!(error = %e, "welcome page not reached");
            return false;
        }
        let question = self.ctx.is_visible(&self.loc.welcome_question, "usage question");
        let business = self.ctx.is_visible(&self.loc.business_needs, "Business needs");
        let personal = self.ctx.is_visible(&self.loc.personal_needs, "Personal needs");
        info!(question, business, personal, "welcome page landmarks");
        question && business && personal
    }
}

impl<D: UiDriver + ?Sized> PageObject for SignUpPage<'_, D> {
    fn page_name(&self) -> &'static str {
        PAGE
    }

    fn is_loaded(&self) -> bool {
        let header = self.ctx.is_displayed(&self.loc.header)
            || self.ctx.is_displayed(&self.loc.header_fallback);
        header
            && self.ctx.is_displayed(&self.loc.container)
            && self.ctx.is_displayed(&self.loc.sign_up_button)
    }

    fn wait_until_loaded(&self) -> bool {
        let waiter = self.ctx.waiter();
        let header = waiter.is_displayed_within(&self.loc.header, waiter.options().timeout())
            || self.ctx.is_displayed(&self.loc.header_fallback);
        if !header {
            warn!("sign-up header not visible");
        }
        let container = self.ctx.is_visible(&self.loc.container, "sign-up form");
        let button = self.ctx.is_visible(&self.loc.sign_up_button, "Sign Up button");
        info!(header, container, button, "sign-up page load check");
        header && container && button
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::mock::{ClickAction, MockDriver, MockElement, NodeId};
    use crate::test_data::{Seed, DESIGNATIONS};

    fn settings() -> Settings {
        Settings {
            explicit_wait_ms: 40,
            poll_interval_ms: 2,
            click_timeout_secs: 1,
            ..Settings::default()
        }
    }

    struct Form {
        fields: Vec<NodeId>,
        button: NodeId,
        toast: NodeId,
    }

    fn sign_up_form(driver: &MockDriver, header: &str, with_confirm: bool) -> Form {
        let loc = SignUpLocators::default();
        let header_loc = if header.starts_with("Create an") || header == "Create Account" {
            &loc.header
        } else {
            &loc.header_fallback
        };
        driver.add(MockElement::new("h1").matching_locator(header_loc).text(header));
        let card = driver.add(MockElement::new("div").matching_locator(&loc.container));
        for label in ["Full name", "Email", "Phone number", "Password"] {
            let label = MockElement::new("label").matching_locator(&loc.field_labels).text(label);
            driver.add_child(card, label);
        }
        let mut inputs = vec![&loc.full_name, &loc.email, &loc.phone, &loc.password];
        if with_confirm {
            inputs.push(&loc.confirm_password);
        }
        let fields = inputs
            .into_iter()
            .map(|l| driver.add_child(card, MockElement::new("input").matching_locator(l)))
            .collect();
        let button = driver.add(MockElement::new("button").matching_locator(&loc.sign_up_button));
        let toast =
            driver.add(MockElement::new("div").matching_locator(&loc.success_message).hidden());
        driver.on_click(button, ClickAction::Show(toast));
        Form { fields, button, toast }
    }

    mod form {
        use super::*;

        #[test]
        fn test_loaded_and_labels() {
            let driver = MockDriver::new();
            sign_up_form(&driver, "Create an account", true);
            let page = SignUpPage::new(PageContext::new(&driver, settings()));
            assert!(page.wait_until_loaded());
            assert!(page.is_loaded());
            assert_eq!(page.header_text().unwrap(), "Create an account");
            assert_eq!(
                page.form_field_labels(),
                vec!["Full name", "Email", "Phone number", "Password"]
            );
        }

        #[test]
        fn test_header_fallback() {
            let driver = MockDriver::new();
            sign_up_form(&driver, "Create your workspace", true);
            let page = SignUpPage::new(PageContext::new(&driver, settings()));
            assert!(page.wait_until_loaded());
            assert_eq!(page.header_text().unwrap(), "Create your workspace");
        }

        #[test]
        fn test_not_loaded_without_button() {
            let driver = MockDriver::new();
            let f = sign_up_form(&driver, "Create Account", true);
            driver.set_displayed(f.button, false);
            let page = SignUpPage::new(PageContext::new(&driver, settings()));
            assert!(!page.wait_until_loaded());
            assert!(!page.is_sign_up_enabled());
        }

        #[test]
        fn test_fill_and_submit() {
            let driver = MockDriver::new();
            let f = sign_up_form(&driver, "Create an account", true);
            let page = SignUpPage::new(PageContext::new(&driver, settings()));
            let data = TestDataGenerator::new(Seed::from_u64(11)).sign_up_form();

            page.fill_form(&data).unwrap();
            let values: Vec<String> = f
                .fields
                .iter()
                .map(|&n| driver.node_attr(n, "value").unwrap_or_default())
                .collect();
            assert_eq!(
                values,
                vec![
                    data.full_name.clone(),
                    data.email.clone(),
                    data.phone.clone(),
                    data.password.clone(),
                    data.password.clone(),
                ]
            );

            assert!(page.is_sign_up_enabled());
            page.click_sign_up().unwrap();
            assert!(driver.displayed(f.toast));
            assert!(page.is_account_created_message_visible());
        }

        #[test]
        fn test_fill_without_confirmation_field() {
            let driver = MockDriver::new();
            let f = sign_up_form(&driver, "Create an account", false);
            let page = SignUpPage::new(PageContext::new(&driver, settings()));
            let data = TestDataGenerator::new(Seed::from_u64(12)).sign_up_form();
            page.fill_form(&data).unwrap();
            assert_eq!(f.fields.len(), 4);
            assert_eq!(driver.node_attr(f.fields[3], "value").unwrap(), data.password);
            let typed = driver.history().iter().filter(|c| c.starts_with("send_keys:")).count();
            assert_eq!(typed, 4);
        }
    }

    mod onboarding {
        use super::*;

        fn onboarding(driver: &MockDriver) -> (NodeId, NodeId) {
            let loc = SignUpLocators::default();
            driver.add(
                MockElement::new("label")
                    .matching_locator(&loc.onboarding_name_label)
                    .text("Full Name"),
            );
            let name =
                driver.add(MockElement::new("input").matching_locator(&loc.onboarding_name_input));
            driver.add(
                MockElement::new("label")
                    .matching_locator(&loc.designation_label)
                    .text("Designation"),
            );
            driver.add(MockElement::new("input").matching_locator(&loc.designation_select));
            driver.add(MockElement::new("input").matching_locator(&loc.designation_input));
            for d in DESIGNATIONS {
                let option = loc.designation_option(d);
                driver.add(MockElement::new("div").matching_locator(&option).text(*d));
            }
            let next = driver.add(MockElement::new("p").matching_locator(&loc.next).text("Next"));
            let welcome = ClickAction::Navigate("https://app.test/grc/welcome".to_string());
            driver.on_click(next, welcome);
            driver.add(MockElement::new("label").matching_locator(&loc.welcome_question));
            driver.add(MockElement::new("p").matching_locator(&loc.business_needs));
            driver.add(MockElement::new("p").matching_locator(&loc.personal_needs));
            (name, next)
        }

        #[test]
        fn test_full_name_step() {
            let driver = MockDriver::new();
            let (name, _) = onboarding(&driver);
            let page = SignUpPage::new(PageContext::new(&driver, settings()));
            assert!(page.is_full_name_step_visible());
            page.enter_full_name("  Asha Rao ").unwrap();
            assert_eq!(driver.node_attr(name, "value").unwrap(), "Asha Rao");
        }

        #[test]
        fn test_blank_full_name_rejected() {
            let driver = MockDriver::new();
            let (name, _) = onboarding(&driver);
            let page = SignUpPage::new(PageContext::new(&driver, settings()));
            let err = page.enter_full_name(" \t").unwrap_err();
            assert!(matches!(err, PomError::Validation { .. }));
            assert!(driver.node_attr(name, "value").is_none());
        }

        #[test]
        fn test_designation_leads_to_welcome() {
            let driver = MockDriver::at("https://app.test/grc/onboarding");
            let (_, next) = onboarding(&driver);
            let page = SignUpPage::new(PageContext::new(&driver, settings()));
            assert!(page.is_designation_step_visible());
            assert!(!page.wait_for_welcome_page(Duration::from_millis(10)));

            let mut gen = TestDataGenerator::new(Seed::from_u64(5));
            let chosen = page.choose_designation(&mut gen).unwrap();
            assert!(DESIGNATIONS.contains(&chosen.as_str()));
            assert_eq!(driver.click_count(next), 1);
            assert!(page.wait_for_welcome_page(Duration::from_millis(30)));
        }
    }
}
