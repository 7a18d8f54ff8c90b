//! Wait Mechanisms
//!
//! Blocking, timeout-bounded polling over a [`UiDriver`].
//!
//! Every wait re-resolves its locator on each poll, so a tree rebuilt between
//! two polls is harmless. Transient driver errors (stale handle, element not
//! there yet, not interactable yet) are swallowed while polling; the error
//! seen on the final poll is attached to the [`PomError::Timeout`] so a
//! failed wait still explains itself. Anything non-transient, such as a lost
//! session, aborts the wait immediately.

use crate::driver::{resolve_all, resolve_first, DriverResult, ElementHandle, UiDriver};
use crate::locator::Locator;
use crate::result::{DriverError, PomError, PomResult};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default explicit wait (10 seconds)
pub const DEFAULT_EXPLICIT_WAIT_MS: u64 = 10_000;

/// Default polling interval (150ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 150;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_EXPLICIT_WAIT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set timeout from a duration
    #[must_use]
    pub const fn with_timeout_duration(self, timeout: Duration) -> Self {
        self.with_timeout(timeout.as_millis() as u64)
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// Something a [`Waiter`] can wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// First element of the locator is displayed
    Visible(Locator),
    /// A specific handle is displayed
    VisibleHandle(ElementHandle),
    /// No element of the locator is displayed (absent counts as invisible)
    Invisible(Locator),
    /// First element of the locator is displayed and enabled
    Clickable(Locator),
    /// Trimmed text of the handle equals the expected value
    TextEquals(ElementHandle, String),
    /// Text of the first element of the locator contains the fragment
    TextContains(Locator, String),
    /// At least one element matches and all of them are displayed
    AllVisible(Locator),
    /// Current URL contains any of the fragments
    UrlContainsAny(Vec<String>),
}

impl Condition {
    /// Human-readable description used in logs and timeout errors
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Visible(loc) => format!("visibility of {loc}"),
            Self::VisibleHandle(h) => format!("visibility of {h}"),
            Self::Invisible(loc) => format!("invisibility of {loc}"),
            Self::Clickable(loc) => format!("clickability of {loc}"),
            Self::TextEquals(h, text) => format!("text {text:?} in {h}"),
            Self::TextContains(loc, text) => format!("text containing {text:?} in {loc}"),
            Self::AllVisible(loc) => format!("visibility of all {loc}"),
            Self::UrlContainsAny(frags) => format!("url containing any of {frags:?}"),
        }
    }

    /// One poll: `Some(elements)` once satisfied
    fn evaluate<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
    ) -> DriverResult<Option<Vec<ElementHandle>>> {
        match self {
            Self::Visible(loc) => {
                let el = resolve_first(driver, loc)?;
                Ok(driver.is_displayed(&el)?.then(|| vec![el]))
            }
            Self::VisibleHandle(h) => Ok(driver.is_displayed(h)?.then(|| vec![h.clone()])),
            Self::Invisible(loc) => {
                for el in resolve_all(driver, loc)? {
                    match driver.is_displayed(&el) {
                        Ok(true) => return Ok(None),
                        Ok(false) => {}
                        // detached from the tree: gone, so not visible
                        Err(e) if e.is_stale() => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(Some(Vec::new()))
            }
            Self::Clickable(loc) => {
                let el = resolve_first(driver, loc)?;
                let ready = driver.is_displayed(&el)? && driver.is_enabled(&el)?;
                Ok(ready.then(|| vec![el]))
            }
            Self::TextEquals(h, expected) => {
                let text = driver.text(h)?;
                Ok((text.trim() == expected.trim()).then(|| vec![h.clone()]))
            }
            Self::TextContains(loc, fragment) => {
                let el = resolve_first(driver, loc)?;
                let text = driver.text(&el)?;
                Ok(text.contains(fragment.as_str()).then(|| vec![el]))
            }
            Self::AllVisible(loc) => {
                let all = resolve_all(driver, loc)?;
                if all.is_empty() {
                    return Err(DriverError::no_such_element(loc.to_string()));
                }
                for el in &all {
                    if !driver.is_displayed(el)? {
                        return Ok(None);
                    }
                }
                Ok(Some(all))
            }
            Self::UrlContainsAny(frags) => {
                let url = driver.current_url()?;
                Ok(frags
                    .iter()
                    .any(|f| url.contains(f.as_str()))
                    .then(Vec::new))
            }
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description())
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time elapsed before the condition held
    pub elapsed: Duration,
    /// What was waited for
    pub waited_for: String,
    /// Elements that satisfied the condition (empty for invisibility/url waits)
    pub elements: Vec<ElementHandle>,
}

impl WaitResult {
    /// First matched element, if any
    #[must_use]
    pub fn element(&self) -> Option<&ElementHandle> {
        self.elements.first()
    }

    fn into_first(self) -> PomResult<ElementHandle> {
        let waited_for = self.waited_for;
        self.elements.into_iter().next().ok_or(PomError::NotFound {
            what: waited_for,
            visible: Vec::new(),
        })
    }
}

// =============================================================================
// WAITER IMPLEMENTATION
// =============================================================================

/// Poll-based waiter bound to one driver session
#[derive(Debug)]
pub struct Waiter<'d, D: UiDriver + ?Sized> {
    driver: &'d D,
    options: WaitOptions,
}

impl<D: UiDriver + ?Sized> Clone for Waiter<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: UiDriver + ?Sized> Copy for Waiter<'_, D> {}

impl<'d, D: UiDriver + ?Sized> Waiter<'d, D> {
    /// Create a waiter with default options
    pub fn new(driver: &'d D) -> Self {
        Self::with_options(driver, WaitOptions::default())
    }

    /// Create a waiter with custom options
    pub const fn with_options(driver: &'d D, options: WaitOptions) -> Self {
        Self { driver, options }
    }

    /// Underlying driver
    pub const fn driver(&self) -> &'d D {
        self.driver
    }

    /// Default options of this waiter
    pub const fn options(&self) -> WaitOptions {
        self.options
    }

    /// Same waiter with a different timeout
    #[must_use]
    pub const fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            driver: self.driver,
            options: self.options.with_timeout_duration(timeout),
        }
    }

    /// Generic poll loop.
    ///
    /// `attempt` returns `Ok(Some(_))` when satisfied. Transient errors are
    /// remembered and polling continues; a successful but unsatisfied poll
    /// clears the remembered error.
    pub fn poll<T>(
        &self,
        description: &str,
        options: &WaitOptions,
        mut attempt: impl FnMut() -> DriverResult<Option<T>>,
    ) -> PomResult<(T, Duration)> {
        let start = Instant::now();
        let timeout = options.timeout();
        let mut last_error: Option<DriverError> = None;

        loop {
            match attempt() {
                Ok(Some(value)) => return Ok((value, start.elapsed())),
                Ok(None) => last_error = None,
                Err(e) if e.is_transient() => {
                    debug!(condition = description, error = %e, "transient error while polling");
                    last_error = Some(e);
                }
                Err(e) => return Err(e.into()),
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                debug!(
                    condition = description,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "wait timed out"
                );
                return Err(PomError::Timeout {
                    condition: description.to_string(),
                    elapsed_ms: elapsed.as_millis() as u64,
                    last_error,
                });
            }
            std::thread::sleep(options.poll_interval().min(timeout - elapsed));
        }
    }

    /// Wait for a condition using this waiter's options
    pub fn wait_for(&self, condition: &Condition) -> PomResult<WaitResult> {
        self.wait_for_with(condition, &self.options)
    }

    /// Wait for a condition with explicit options
    pub fn wait_for_with(
        &self,
        condition: &Condition,
        options: &WaitOptions,
    ) -> PomResult<WaitResult> {
        let description = condition.description();
        let (elements, elapsed) =
            self.poll(&description, options, || condition.evaluate(self.driver))?;
        Ok(WaitResult {
            elapsed,
            waited_for: description,
            elements,
        })
    }

    /// Wait until the locator's first element is visible
    pub fn wait_for_visibility(&self, locator: &Locator) -> PomResult<ElementHandle> {
        self.wait_for(&Condition::Visible(locator.clone()))?
            .into_first()
    }

    /// Wait until an already-resolved handle is visible
    pub fn wait_for_visibility_of_handle(
        &self,
        handle: &ElementHandle,
    ) -> PomResult<ElementHandle> {
        self.wait_for(&Condition::VisibleHandle(handle.clone()))?
            .into_first()
    }

    /// Visibility wait with its own timeout
    pub fn wait_for_visibility_custom_timeout(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> PomResult<ElementHandle> {
        let options = self.options.with_timeout_duration(timeout);
        self.wait_for_with(&Condition::Visible(locator.clone()), &options)?
            .into_first()
    }

    /// Wait until every element of the locator is visible (at least one)
    pub fn wait_for_visibility_of_all(&self, locator: &Locator) -> PomResult<Vec<ElementHandle>> {
        Ok(self
            .wait_for(&Condition::AllVisible(locator.clone()))?
            .elements)
    }

    /// Wait until the locator's first element is visible and enabled
    pub fn wait_for_clickable(&self, locator: &Locator) -> PomResult<ElementHandle> {
        self.wait_for(&Condition::Clickable(locator.clone()))?
            .into_first()
    }

    /// Clickability wait with its own timeout
    pub fn wait_for_clickable_within(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> PomResult<ElementHandle> {
        let options = self.options.with_timeout_duration(timeout);
        self.wait_for_with(&Condition::Clickable(locator.clone()), &options)?
            .into_first()
    }

    /// Wait until nothing matching the locator is visible
    pub fn wait_for_invisibility(&self, locator: &Locator) -> PomResult<Duration> {
        Ok(self
            .wait_for(&Condition::Invisible(locator.clone()))?
            .elapsed)
    }

    /// Invisibility wait with its own timeout
    pub fn wait_for_invisibility_within(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> PomResult<Duration> {
        let options = self.options.with_timeout_duration(timeout);
        Ok(self
            .wait_for_with(&Condition::Invisible(locator.clone()), &options)?
            .elapsed)
    }

    /// Wait until the handle's trimmed text equals `expected`
    pub fn wait_for_text(&self, handle: &ElementHandle, expected: &str) -> PomResult<()> {
        self.wait_for(&Condition::TextEquals(handle.clone(), expected.to_string()))
            .map(|_| ())
    }

    /// Wait until the locator's text contains `fragment`
    pub fn wait_for_text_containing(
        &self,
        locator: &Locator,
        fragment: &str,
    ) -> PomResult<ElementHandle> {
        self.wait_for(&Condition::TextContains(locator.clone(), fragment.to_string()))?
            .into_first()
    }

    /// Wait until the current URL contains any fragment; returns that URL
    pub fn wait_for_url_contains_any(&self, fragments: &[&str]) -> PomResult<String> {
        let condition =
            Condition::UrlContainsAny(fragments.iter().map(|f| (*f).to_string()).collect());
        self.wait_for(&condition)?;
        Ok(self.driver.current_url()?)
    }

    /// Re-resolve the locator on every poll and report whether it became
    /// visible within `timeout`. Never raises.
    pub fn wait_until_displayed_refreshed(&self, locator: &Locator, timeout: Duration) -> bool {
        match self.wait_for_visibility_custom_timeout(locator, timeout) {
            Ok(_) => true,
            Err(e) => {
                warn!(locator = %locator, error = %e, "element not displayed after refresh wait");
                false
            }
        }
    }

    /// Quiet variant of [`Self::wait_until_displayed_refreshed`] for probing
    pub fn is_displayed_within(&self, locator: &Locator, timeout: Duration) -> bool {
        self.wait_for_visibility_custom_timeout(locator, timeout)
            .is_ok()
    }

    /// Poll an arbitrary predicate until it returns `true`
    pub fn wait_until_true(
        &self,
        description: &str,
        timeout: Duration,
        mut predicate: impl FnMut(&'d D) -> DriverResult<bool>,
    ) -> PomResult<Duration> {
        let options = self.options.with_timeout_duration(timeout);
        let driver = self.driver;
        self.poll(description, &options, || {
            predicate(driver).map(|ok| ok.then_some(()))
        })
        .map(|((), elapsed)| elapsed)
    }
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Whether the locator's first element is displayed right now. Never raises.
pub fn is_element_displayed<D: UiDriver + ?Sized>(driver: &D, locator: &Locator) -> bool {
    resolve_first(driver, locator)
        .and_then(|el| driver.is_displayed(&el))
        .unwrap_or(false)
}

// =============================================================================
// TESTS
// =============================================================================
