//! Resilient interaction primitives.
//!
//! [`safe_click`] is the single entry point page objects use to click
//! anything. It waits for clickability, scrolls the element into view, and
//! clicks natively. An overlay that intercepts the click is answered with a
//! forced script click on the same element. A stale handle is answered by
//! re-resolving the locator and running the whole sequence exactly once more.
//!
//! A driver `click` that returned `Ok` ends the call, so a staleness retry can
//! never repeat a click that already registered.

use crate::driver::{resolve_first, ElementHandle, UiDriver};
use crate::locator::Locator;
use crate::result::{DriverError, PomError, PomResult};
use crate::wait::Waiter;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Script that centers `arguments[0]` in the viewport
pub const SCROLL_INTO_VIEW_SCRIPT: &str =
    "arguments[0].scrollIntoView({block: 'center', inline: 'nearest'});";

/// Script that dispatches a click on `arguments[0]` bypassing hit-testing
pub const FORCE_CLICK_SCRIPT: &str = "arguments[0].click();";

/// Default safe-click timeout in seconds
pub const DEFAULT_CLICK_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CLICK TARGET
// =============================================================================

/// What [`safe_click`] should click
#[derive(Debug, Clone, Copy)]
pub enum ClickTarget<'a> {
    /// Resolve the locator (and re-resolve it after staleness)
    Locator(&'a Locator),
    /// Click an already resolved handle
    Handle {
        /// Handle to click
        handle: &'a ElementHandle,
        /// Locator used to recover when the handle goes stale
        locator: Option<&'a Locator>,
    },
}

impl<'a> From<&'a Locator> for ClickTarget<'a> {
    fn from(locator: &'a Locator) -> Self {
        Self::Locator(locator)
    }
}

impl<'a> From<&'a ElementHandle> for ClickTarget<'a> {
    fn from(handle: &'a ElementHandle) -> Self {
        Self::Handle {
            handle,
            locator: None,
        }
    }
}

impl<'a> ClickTarget<'a> {
    /// Handle target that can recover through `locator`
    pub const fn handle_with_locator(handle: &'a ElementHandle, locator: &'a Locator) -> Self {
        Self::Handle {
            handle,
            locator: Some(locator),
        }
    }

    fn locator(&self) -> Option<&'a Locator> {
        match *self {
            Self::Locator(loc) => Some(loc),
            Self::Handle { locator, .. } => locator,
        }
    }
}

// =============================================================================
// SAFE CLICK
// =============================================================================

/// Click with bounded recovery.
///
/// Fails with [`PomError::Click`] carrying `label` once the clickability
/// wait, the forced-click fallback and the single staleness retry are all
/// exhausted.
pub fn safe_click<'a, D: UiDriver + ?Sized>(
    waiter: &Waiter<'_, D>,
    target: impl Into<ClickTarget<'a>>,
    label: &str,
    timeout_secs: u64,
) -> PomResult<()> {
    let target = target.into();
    let timeout = Duration::from_secs(timeout_secs);
    let mut use_locator = matches!(target, ClickTarget::Locator(_));
    let mut refreshed = false;

    loop {
        let outcome = if use_locator {
            target
                .locator()
                .ok_or_else(|| PomError::StaleReference {
                    what: label.to_string(),
                })
                .and_then(|loc| click_once(waiter, None, Some(loc), label, timeout))
        } else {
            match target {
                ClickTarget::Handle { handle, .. } => {
                    click_once(waiter, Some(handle), None, label, timeout)
                }
                ClickTarget::Locator(loc) => click_once(waiter, None, Some(loc), label, timeout),
            }
        };

        match outcome {
            Ok(()) => {
                info!(label, "clicked");
                return Ok(());
            }
            Err(e)
                if !refreshed
                    && recoverable_staleness(&e, use_locator)
                    && target.locator().is_some() =>
            {
                warn!(label, error = %e, "stale element while clicking; re-resolving once");
                refreshed = true;
                use_locator = true;
            }
            Err(e) => {
                error!(label, error = %e, "click failed");
                return Err(PomError::Click {
                    label: label.to_string(),
                    source: Box::new(e),
                });
            }
        }
    }
}

fn recoverable_staleness(err: &PomError, locator_attempt: bool) -> bool {
    match err {
        PomError::StaleReference { .. } => true,
        // a handle that went stale during the clickability wait
        PomError::Timeout { .. } => !locator_attempt && err.is_stale(),
        _ => false,
    }
}

fn click_once<D: UiDriver + ?Sized>(
    waiter: &Waiter<'_, D>,
    handle: Option<&ElementHandle>,
    locator: Option<&Locator>,
    label: &str,
    timeout: Duration,
) -> PomResult<()> {
    let driver = waiter.driver();
    let element = match (handle, locator) {
        (Some(h), _) => {
            if let Err(e) = driver.is_displayed(h) {
                if e.is_stale() {
                    return Err(e.into());
                }
            }
            waiter.wait_until_true(&format!("clickability of {label}"), timeout, |d| {
                Ok(d.is_displayed(h)? && d.is_enabled(h)?)
            })?;
            h.clone()
        }
        (None, Some(loc)) => waiter.wait_for_clickable_within(loc, timeout)?,
        (None, None) => {
            return Err(PomError::NotFound {
                what: label.to_string(),
                visible: Vec::new(),
            })
        }
    };

    scroll_into_view(driver, &element)?;

    match driver.click(&element) {
        Ok(()) => Ok(()),
        Err(DriverError::ClickIntercepted { message }) => {
            warn!(label, reason = %message, "native click intercepted; forcing script click");
            force_click(driver, &element, label)
        }
        Err(DriverError::NotInteractable { message }) => {
            warn!(label, reason = %message, "native click not accepted; forcing script click");
            force_click(driver, &element, label)
        }
        Err(e) => Err(e.into()),
    }
}

/// Best-effort scroll; only staleness is reported
pub fn scroll_into_view<D: UiDriver + ?Sized>(
    driver: &D,
    element: &ElementHandle,
) -> PomResult<()> {
    match driver.execute_script(SCROLL_INTO_VIEW_SCRIPT, std::slice::from_ref(element)) {
        Ok(_) => Ok(()),
        Err(e) if e.is_stale() => Err(e.into()),
        Err(e) => {
            debug!(element = %element, error = %e, "scroll into view failed; continuing");
            Ok(())
        }
    }
}

/// Click through a script, bypassing overlays
pub fn force_click<D: UiDriver + ?Sized>(
    driver: &D,
    element: &ElementHandle,
    label: &str,
) -> PomResult<()> {
    match driver.execute_script(FORCE_CLICK_SCRIPT, std::slice::from_ref(element)) {
        Ok(_) => Ok(()),
        Err(e) if e.is_stale() => Err(e.into()),
        Err(e) => Err(PomError::InteractionBlocked {
            what: format!("{label}: native click rejected and forced click failed ({e})"),
        }),
    }
}

// =============================================================================
// SAFE TYPE
// =============================================================================

/// Focus, clear and type into an input.
///
/// The element is re-resolved after the focusing click so the keystrokes go
/// to a fresh handle.
pub fn safe_type<D: UiDriver + ?Sized>(
    waiter: &Waiter<'_, D>,
    locator: &Locator,
    text: &str,
    label: &str,
) -> PomResult<()> {
    waiter.wait_for_visibility(locator)?;
    safe_click(waiter, locator, label, DEFAULT_CLICK_TIMEOUT_SECS)?;
    let driver = waiter.driver();
    let element = resolve_first(driver, locator)?;
    driver.clear(&element)?;
    driver.send_keys(&element, text)?;
    debug!(label, chars = text.chars().count(), "typed");
    Ok(())
}

/// Current `value` of an input, empty when absent
pub fn input_value<D: UiDriver + ?Sized>(driver: &D, locator: &Locator) -> PomResult<String> {
    let element = resolve_first(driver, locator)?;
    Ok(driver.attribute(&element, "value")?.unwrap_or_default())
}

// =============================================================================
// RETRY
// =============================================================================

/// Bounded retry policy for whole UI steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            pause: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy
    #[must_use]
    pub const fn new(max_attempts: u32, pause: Duration) -> Self {
        Self {
            max_attempts,
            pause,
        }
    }

    /// Set the number of attempts
    #[must_use]
    pub const fn with_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the pause between attempts
    #[must_use]
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }
}

/// Run `action` up to `policy.max_attempts` times, returning the last error.
///
/// `action` receives the 1-based attempt number.
pub fn retry<T>(
    policy: &RetryPolicy,
    label: &str,
    mut action: impl FnMut(u32) -> PomResult<T>,
) -> PomResult<T> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match action(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(label, attempt, max = attempts, error = %e, "attempt failed; retrying");
                std::thread::sleep(policy.pause);
                attempt += 1;
            }
            Err(e) => {
                error!(label, attempts, error = %e, "all attempts failed");
                return Err(e);
            }
        }
    }
}

// =============================================================================
// TEXT NORMALIZATION
// =============================================================================

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

/// Normalize rendered text for comparison: non-breaking and other exotic
/// spaces become plain spaces, runs of whitespace collapse, ends are trimmed.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let plain: String = raw
        .chars()
        .filter_map(|c| match c {
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{2009}' | '\u{200A}' => Some(' '),
            '\u{200B}' | '\u{FEFF}' => None,
            other => Some(other),
        })
        .collect();
    whitespace_run().replace_all(plain.trim(), " ").into_owned()
}
