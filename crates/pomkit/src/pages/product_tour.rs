//! Guided product tour shown on the dashboard.
//!
//! The tour is three popups in a fixed order. Every check here answers with
//! a `bool` and logs why; clicks report failure as `false` as well, since a
//! tour that cannot advance is a visible state, not an exception.

use super::base::{PageContext, PageObject};
use crate::driver::{resolve_all, UiDriver};
use crate::locator::Locator;
use crate::wait::is_element_displayed;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Popup headings, in the order the tour shows them
pub const TOUR_HEADINGS: [&str; 3] = [
    "Stay on Top of Your Compliances",
    "Upload Documents with Ease",
    "Your Legal Documents Hub",
];

/// Locators of the tour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourLocators {
    /// "Take product tour" launcher
    pub launcher: Locator,
    /// One locator per entry of [`TOUR_HEADINGS`]
    pub headings: [Locator; 3],
    /// Next button
    pub next: Locator,
    /// Skip button on the first popup
    pub skip: Locator,
    /// Finish button on the last popup
    pub got_it: Locator,
    /// Any loader or spinner covering the page
    pub loaders: Locator,
    /// Generic popup body
    pub popup_body: Locator,
    /// Compliances page marker
    pub compliances_marker: Locator,
}

impl Default for TourLocators {
    fn default() -> Self {
        Self {
            launcher: Locator::xpath_text_equals("p", "Take product tour"),
            headings: TOUR_HEADINGS.map(|h| Locator::xpath_text_equals("div", h)),
            next: Locator::xpath("//button[@aria-label='Next']"),
            skip: Locator::xpath(
                "//button[@aria-label='Skip' or normalize-space()='Skip for now']",
            ),
            got_it: Locator::xpath("//button[@aria-label='Last' or normalize-space()='Got it']"),
            loaders: Locator::xpath(concat!(
                "//*[contains(@class,'loader') or contains(@class,'spinner')",
                " or @data-testid='global-loader']",
            )),
            popup_body: Locator::css("div.__floater__body, div._floater_body"),
            compliances_marker: Locator::xpath(concat!(
                "//p[@class='text-[32px] max-lg:hidden font-semibold']",
                "[normalize-space()='Compliances']",
            )),
        }
    }
}

/// Product tour popups
#[derive(Debug, Clone)]
pub struct ProductTour<'d, D: UiDriver + ?Sized> {
    ctx: PageContext<'d, D>,
    loc: TourLocators,
}

impl<'d, D: UiDriver + ?Sized> ProductTour<'d, D> {
    /// Tour with the default locators
    pub fn new(ctx: PageContext<'d, D>) -> Self {
        Self::with_locators(ctx, TourLocators::default())
    }

    /// Tour with custom locators
    pub fn with_locators(ctx: PageContext<'d, D>, loc: TourLocators) -> Self {
        Self { ctx, loc }
    }

    /// Locators in use
    pub fn locators(&self) -> &TourLocators {
        &self.loc
    }

    /// Launcher is displayed
    pub fn is_launcher_visible(&self) -> bool {
        let visible = self.ctx.is_visible(&self.loc.launcher, "Take Product Tour");
        info!(visible, "tour launcher");
        visible
    }

    /// Click the launcher
    pub fn start(&self) -> bool {
        self.click("Take Product Tour", &self.loc.launcher)
    }

    /// First popup appears within `timeout`
    pub fn wait_for_first_step(&self, timeout: Duration) -> bool {
        let first = &self.loc.headings[0];
        match self.ctx.waiter().wait_for_visibility_custom_timeout(first, timeout) {
            Ok(_) => {
                info!(heading = TOUR_HEADINGS[0], "first tour step visible");
                true
            }
            Err(e) => {
                error!(
                    timeout_ms = timeout.as_millis() as u64,
                    error = %e,
                    "first tour step not visible"
                );
                false
            }
        }
    }

    /// Wait until no loader is displayed; gives up quietly after `timeout`
    pub fn wait_for_blocking_loaders(&self, timeout: Duration) -> bool {
        let loaders = &self.loc.loaders;
        let cleared = self
            .ctx
            .waiter()
            .wait_until_true("blocking loaders gone", timeout, |d| {
                let mut any_shown = false;
                for el in resolve_all(d, loaders)? {
                    match d.is_displayed(&el) {
                        Ok(true) => any_shown = true,
                        Ok(false) => {}
                        Err(e) if e.is_stale() => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(!any_shown)
            })
            .is_ok();
        if cleared {
            info!("no blocking loader");
        } else {
            warn!(timeout_ms = timeout.as_millis() as u64, "blocking loader may still be present");
        }
        cleared
    }

    fn heading_locator(&self, heading: &str) -> Locator {
        let wanted = heading.trim();
        TOUR_HEADINGS
            .iter()
            .position(|h| h.eq_ignore_ascii_case(wanted))
            .map_or_else(
                || {
                    warn!(heading = wanted, "unknown popup heading; matching by contains()");
                    Locator::xpath_text_contains("div", wanted)
                },
                |i| self.loc.headings[i].clone(),
            )
    }

    /// Popup headed `heading` is displayed; unknown headings are matched
    /// by substring
    pub fn is_step_visible(&self, heading: &str) -> bool {
        let locator = self.heading_locator(heading);
        let visible = self.ctx.is_visible(&locator, heading);
        info!(heading, visible, "tour step");
        visible
    }

    /// Advance to the next popup
    pub fn click_next(&self) -> bool {
        self.click("Product Tour: Next", &self.loc.next)
    }

    /// Last popup is displayed
    pub fn is_final_step_visible(&self) -> bool {
        self.is_step_visible(TOUR_HEADINGS[2])
    }

    /// Finish the tour
    pub fn click_got_it(&self) -> bool {
        self.click("Product Tour: Got it", &self.loc.got_it)
    }

    /// Any tour popup is displayed right now
    pub fn is_any_popup_visible(&self) -> bool {
        let driver = self.ctx.driver();
        self.loc.headings.iter().any(|h| is_element_displayed(driver, h))
            || resolve_all(driver, &self.loc.popup_body)
                .map(|bodies| bodies.iter().any(|b| matches!(driver.is_displayed(b), Ok(true))))
                .unwrap_or(false)
    }

    /// Skip the tour and expect the Compliances page within `timeout`
    pub fn skip_and_verify_compliances(&self, timeout: Duration) -> bool {
        // the first popup is usually already up; skip is still attempted
        if let Err(e) = self.ctx.waiter().wait_for_visibility(&self.loc.headings[0]) {
            debug!(error = %e, "first tour popup not visible before skip");
        }
        if !self.click("Skip for now", &self.loc.skip) {
            return false;
        }
        match self
            .ctx
            .waiter()
            .wait_for_visibility_custom_timeout(&self.loc.compliances_marker, timeout)
        {
            Ok(_) => {
                info!("Compliances page visible after skipping tour");
                true
            }
            Err(e) => {
                error!(
                    timeout_ms = timeout.as_millis() as u64,
                    error = %e,
                    "Compliances page not visible after skip"
                );
                false
            }
        }
    }

    /// Compliances page marker is displayed
    pub fn is_compliances_page_visible(&self) -> bool {
        self.ctx.is_visible(&self.loc.compliances_marker, "Compliances page")
    }

    fn click(&self, label: &str, locator: &Locator) -> bool {
        match self.ctx.click(locator, label) {
            Ok(()) => true,
            Err(e) => {
                error!(label, error = %e, "click failed");
                false
            }
        }
    }
}

impl<D: UiDriver + ?Sized> PageObject for ProductTour<'_, D> {
    fn page_name(&self) -> &'static str {
        "Product tour"
    }

    fn is_loaded(&self) -> bool {
        self.ctx.is_displayed(&self.loc.launcher)
    }

    fn wait_until_loaded(&self) -> bool {
        self.is_launcher_visible()
    }
}
