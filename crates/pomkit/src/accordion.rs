//! Toggle/accordion state machine.
//!
//! An accordion row exposes two independent signals: the visibility of its
//! content panel and the asset shown by its toggle icon. They usually agree,
//! but not always (animations, broken assets, half-applied re-renders), so a
//! row's state is three-valued:
//!
//! | content visible | icon      | state           |
//! |-----------------|-----------|-----------------|
//! | yes             | minus     | `Expanded`      |
//! | no              | plus      | `Collapsed`     |
//! | anything else   |           | `Indeterminate` |
//!
//! Reaching a target is judged more leniently for expansion than for
//! collapse: a row counts as expanded once *either* signal says so, but as
//! collapsed only when *both* do.
//!
//! Rows are addressed by position and re-resolved through their locator on
//! every observation; no element handle outlives a single check.

use crate::driver::{count_of, resolve_first, UiDriver};
use crate::interaction::safe_click;
use crate::locator::Locator;
use crate::result::PomError;
use crate::wait::{is_element_displayed, Waiter};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Asset fragment identifying the "expand" icon
pub const PLUS_ASSET: &str = "plus.svg";
/// Asset fragment identifying the "collapse" icon
pub const MINUS_ASSET: &str = "minus.svg";

// =============================================================================
// STATES
// =============================================================================

/// What the toggle icon shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IconState {
    /// Expand icon (`+`)
    Plus,
    /// Collapse icon (`-`)
    Minus,
    /// Missing or unrecognized asset (`?`)
    Unknown,
}

impl IconState {
    /// Classify an icon by its `src` attribute
    #[must_use]
    pub fn from_src(src: Option<&str>) -> Self {
        match src {
            Some(s) if s.contains(PLUS_ASSET) => Self::Plus,
            Some(s) if s.contains(MINUS_ASSET) => Self::Minus,
            _ => Self::Unknown,
        }
    }

    /// Single-character form used in reports
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Unknown => "?",
        }
    }
}

impl fmt::Display for IconState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Combined state of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ToggleState {
    /// Content hidden and icon shows plus
    Collapsed,
    /// Content visible and icon shows minus
    Expanded,
    /// Signals disagree or the icon is unrecognized
    Indeterminate,
}

impl ToggleState {
    /// Combine both signals
    #[must_use]
    pub const fn classify(content_visible: bool, icon: IconState) -> Self {
        match (content_visible, icon) {
            (true, IconState::Minus) => Self::Expanded,
            (false, IconState::Plus) => Self::Collapsed,
            _ => Self::Indeterminate,
        }
    }
}

/// Both signals of a row at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Observation {
    /// Content panel displayed
    pub content_visible: bool,
    /// Icon asset
    pub icon: IconState,
}

impl Observation {
    /// Combined state
    #[must_use]
    pub const fn state(&self) -> ToggleState {
        ToggleState::classify(self.content_visible, self.icon)
    }
}

/// Direction of a toggle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ToggleTarget {
    /// Open rows
    Expand,
    /// Close rows
    Collapse,
}

impl ToggleTarget {
    /// Whether an observation satisfies this target
    #[must_use]
    pub fn is_reached(self, obs: Observation) -> bool {
        match self {
            Self::Expand => obs.content_visible || obs.icon == IconState::Minus,
            Self::Collapse => !obs.content_visible && obs.icon == IconState::Plus,
        }
    }

    const fn verb(self) -> &'static str {
        match self {
            Self::Expand => "expand",
            Self::Collapse => "collapse",
        }
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// One row that reached its target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemToggle {
    /// Zero-based row index
    pub index: usize,
    /// Clicks spent; zero when the row already was in the target state
    pub clicks: u32,
    /// Final combined state
    pub state: ToggleState,
}

/// All rows reached the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// Requested direction
    pub target: ToggleTarget,
    /// Per-row results
    pub items: Vec<ItemToggle>,
}

impl ToggleOutcome {
    /// Rows whose final state is indeterminate despite reaching the target
    #[must_use]
    pub fn indeterminate(&self) -> Vec<usize> {
        self.items
            .iter()
            .filter(|i| i.state == ToggleState::Indeterminate)
            .map(|i| i.index)
            .collect()
    }
}

/// One row that did not reach its target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleFailure {
    /// Zero-based row index
    pub index: usize,
    /// Signals after the last attempt
    pub last_seen: Observation,
    /// Last click error, if clicking itself failed
    pub last_error: Option<String>,
}

/// Some rows did not reach the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleFailures {
    /// Requested direction
    pub target: ToggleTarget,
    /// Rows that did reach the target
    pub succeeded: Vec<ItemToggle>,
    /// Rows that did not
    pub failed: Vec<ToggleFailure>,
}

impl ToggleFailures {
    /// Zero-based indices of failed rows
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.failed.iter().map(|f| f.index).collect()
    }
}

impl fmt::Display for ToggleFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list: Vec<String> = self.failed.iter().map(|x| format!("#{}", x.index + 1)).collect();
        write!(f, "failed to {} item(s) {}", self.target.verb(), list.join(", "))
    }
}

impl std::error::Error for ToggleFailures {}

impl From<ToggleFailures> for PomError {
    fn from(failures: ToggleFailures) -> Self {
        Self::validation("accordion", failures.to_string())
    }
}

// =============================================================================
// ACCORDION
// =============================================================================

/// Locators and limits for one accordion.
///
/// `title`, `toggle`, `icon` and `content` are resolved inside each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accordion {
    /// Rows
    pub items: Locator,
    /// Row title, relative to the row
    pub title: Locator,
    /// Clickable toggle, relative to the row
    pub toggle: Locator,
    /// Toggle icon, relative to the row
    pub icon: Locator,
    /// Content panel, relative to the row
    pub content: Locator,
    /// Attempts per row
    pub attempts: u32,
    /// Safe-click timeout per attempt, in seconds
    pub click_timeout_secs: u64,
    /// How long to wait for the signals to settle after a click
    pub settle: Duration,
}

impl Accordion {
    /// Accordion with 3 attempts per row and an 8 second click timeout
    pub fn new(
        items: Locator,
        title: Locator,
        toggle: Locator,
        icon: Locator,
        content: Locator,
    ) -> Self {
        Self {
            items,
            title,
            toggle,
            icon,
            content,
            attempts: 3,
            click_timeout_secs: 8,
            settle: Duration::from_millis(1_500),
        }
    }

    /// Set attempts per row
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Set the settle wait after each click
    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Set the per-attempt click timeout
    #[must_use]
    pub fn with_click_timeout(mut self, secs: u64) -> Self {
        self.click_timeout_secs = secs;
        self
    }

    /// Locator of row `index`
    #[must_use]
    pub fn row(&self, index: usize) -> Locator {
        self.items.clone().nth(index)
    }

    fn part(&self, index: usize, part: &Locator) -> Locator {
        self.row(index).child(part)
    }

    /// Number of rows currently rendered
    pub fn item_count<D: UiDriver + ?Sized>(&self, waiter: &Waiter<'_, D>) -> usize {
        count_of(waiter.driver(), &self.items)
    }

    /// Trimmed row titles in order.
    ///
    /// A title whose read fails transiently is re-resolved once; one that
    /// still cannot be read is logged and returned as an empty string.
    pub fn titles<D: UiDriver + ?Sized>(&self, waiter: &Waiter<'_, D>) -> Vec<String> {
        let driver = waiter.driver();
        (0..self.item_count(waiter))
            .map(|i| {
                let locator = self.part(i, &self.title);
                let read = || resolve_first(driver, &locator).and_then(|el| driver.text(&el));
                let text = match read() {
                    Err(e) if e.is_transient() => {
                        debug!(index = i + 1, error = %e, "title read failed; re-resolving");
                        read()
                    }
                    other => other,
                };
                match text.map(|t| t.trim().to_string()) {
                    Ok(t) if t.is_empty() => {
                        warn!(index = i + 1, "question title is empty");
                        t
                    }
                    Ok(t) => t,
                    Err(e) => {
                        error!(index = i + 1, error = %e, "could not read question title");
                        String::new()
                    }
                }
            })
            .collect()
    }

    /// Icon state of row `index`
    pub fn icon_state<D: UiDriver + ?Sized>(
        &self,
        waiter: &Waiter<'_, D>,
        index: usize,
    ) -> IconState {
        let driver = waiter.driver();
        match resolve_first(driver, &self.part(index, &self.icon))
            .and_then(|el| driver.attribute(&el, "src"))
        {
            Ok(src) => IconState::from_src(src.as_deref()),
            Err(e) => {
                warn!(index = index + 1, error = %e, "could not read icon");
                IconState::Unknown
            }
        }
    }

    /// Icon states of all rows
    pub fn icon_states<D: UiDriver + ?Sized>(&self, waiter: &Waiter<'_, D>) -> Vec<IconState> {
        let states: Vec<IconState> = (0..self.item_count(waiter))
            .map(|i| self.icon_state(waiter, i))
            .collect();
        for (i, s) in states.iter().enumerate() {
            if *s == IconState::Unknown {
                warn!(index = i + 1, "unknown icon state");
            }
        }
        states
    }

    /// Both signals of row `index`, freshly resolved
    pub fn observe<D: UiDriver + ?Sized>(
        &self,
        waiter: &Waiter<'_, D>,
        index: usize,
    ) -> Observation {
        let content = self.part(index, &self.content);
        Observation {
            content_visible: is_element_displayed(waiter.driver(), &content),
            icon: self.icon_state(waiter, index),
        }
    }

    /// Combined state of row `index`
    pub fn item_state<D: UiDriver + ?Sized>(
        &self,
        waiter: &Waiter<'_, D>,
        index: usize,
    ) -> ToggleState {
        self.observe(waiter, index).state()
    }

    /// Combined state of every row; indeterminate rows are logged as anomalies
    pub fn states<D: UiDriver + ?Sized>(&self, waiter: &Waiter<'_, D>) -> Vec<ToggleState> {
        (0..self.item_count(waiter))
            .map(|i| {
                let obs = self.observe(waiter, i);
                let state = obs.state();
                if state == ToggleState::Indeterminate {
                    warn!(
                        index = i + 1,
                        content_visible = obs.content_visible,
                        icon = %obs.icon,
                        "icon and content disagree"
                    );
                }
                state
            })
            .collect()
    }

    /// Drive row `index` to `target`
    pub fn toggle_item<D: UiDriver + ?Sized>(
        &self,
        waiter: &Waiter<'_, D>,
        index: usize,
        target: ToggleTarget,
    ) -> Result<ItemToggle, ToggleFailure> {
        let label = format!("Accordion toggle #{} ({})", index + 1, target.verb());
        let toggle = self.part(index, &self.toggle);
        let mut last_error = None;
        let mut clicks = 0;

        let before = self.observe(waiter, index);
        info!(
            index = index + 1,
            icon = %before.icon,
            content_visible = before.content_visible,
            "{} item",
            target.verb()
        );

        for attempt in 1..=self.attempts.max(1) {
            let now = self.observe(waiter, index);
            if target.is_reached(now) {
                if clicks == 0 {
                    info!(index = index + 1, "already in target state; not clicking");
                }
                return Ok(ItemToggle {
                    index,
                    clicks,
                    state: now.state(),
                });
            }

            if let Err(e) = safe_click(waiter, &toggle, &label, self.click_timeout_secs) {
                warn!(index = index + 1, attempt, error = %e, "toggle click failed");
                last_error = Some(e.to_string());
                continue;
            }
            clicks += 1;

            let settled = waiter.wait_until_true(&label, self.settle, |_| {
                Ok(target.is_reached(self.observe(waiter, index)))
            });
            let after = self.observe(waiter, index);
            if settled.is_ok() || target.is_reached(after) {
                info!(
                    index = index + 1,
                    attempt,
                    icon = %after.icon,
                    content_visible = after.content_visible,
                    "reached target"
                );
                return Ok(ItemToggle {
                    index,
                    clicks,
                    state: after.state(),
                });
            }
            warn!(
                index = index + 1,
                attempt,
                icon = %after.icon,
                content_visible = after.content_visible,
                "target not reached yet"
            );
        }

        let last_seen = self.observe(waiter, index);
        error!(index = index + 1, attempts = self.attempts, "failed to {} item", target.verb());
        Err(ToggleFailure {
            index,
            last_seen,
            last_error,
        })
    }

    /// Expand row `index`
    pub fn expand_item<D: UiDriver + ?Sized>(
        &self,
        waiter: &Waiter<'_, D>,
        index: usize,
    ) -> Result<ItemToggle, ToggleFailure> {
        self.toggle_item(waiter, index, ToggleTarget::Expand)
    }

    /// Collapse row `index`
    pub fn collapse_item<D: UiDriver + ?Sized>(
        &self,
        waiter: &Waiter<'_, D>,
        index: usize,
    ) -> Result<ItemToggle, ToggleFailure> {
        self.toggle_item(waiter, index, ToggleTarget::Collapse)
    }

    /// Drive every row to `target`; rows are independent
    pub fn toggle_all<D: UiDriver + ?Sized>(
        &self,
        waiter: &Waiter<'_, D>,
        target: ToggleTarget,
    ) -> Result<ToggleOutcome, ToggleFailures> {
        let count = self.item_count(waiter);
        info!(count, "{} all accordion items", target.verb());

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for index in 0..count {
            match self.toggle_item(waiter, index, target) {
                Ok(item) => succeeded.push(item),
                Err(failure) => failed.push(failure),
            }
        }

        if failed.is_empty() {
            let outcome = ToggleOutcome {
                target,
                items: succeeded,
            };
            let odd = outcome.indeterminate();
            if !odd.is_empty() {
                warn!(items = ?odd, "rows reached target with disagreeing signals");
            }
            info!(count, "all items processed");
            Ok(outcome)
        } else {
            let failures = ToggleFailures {
                target,
                succeeded,
                failed,
            };
            error!("{failures}");
            Err(failures)
        }
    }

    /// Expand every row
    pub fn expand_all<D: UiDriver + ?Sized>(
        &self,
        waiter: &Waiter<'_, D>,
    ) -> Result<ToggleOutcome, ToggleFailures> {
        self.toggle_all(waiter, ToggleTarget::Expand)
    }

    /// Collapse every row
    pub fn collapse_all<D: UiDriver + ?Sized>(
        &self,
        waiter: &Waiter<'_, D>,
    ) -> Result<ToggleOutcome, ToggleFailures> {
        self.toggle_all(waiter, ToggleTarget::Collapse)
    }

    /// Per row: content panel displayed with non-blank text
    pub fn contents_visible_and_non_empty<D: UiDriver + ?Sized>(
        &self,
        waiter: &Waiter<'_, D>,
    ) -> Vec<bool> {
        let driver = waiter.driver();
        (0..self.item_count(waiter))
            .map(|i| {
                let content = self.part(i, &self.content);
                let checked = resolve_first(driver, &content).and_then(|el| {
                    let visible = driver.is_displayed(&el)?;
                    let len = driver.text(&el)?.trim().chars().count();
                    Ok((visible, len))
                });
                match checked {
                    Ok((visible, len)) if visible && len > 0 => {
                        info!(index = i + 1, len, "content OK");
                        true
                    }
                    Ok((visible, len)) => {
                        warn!(index = i + 1, visible, len, "content issue");
                        false
                    }
                    Err(e) => {
                        error!(index = i + 1, error = %e, "content not readable");
                        false
                    }
                }
            })
            .collect()
    }
}
