//! Pomkit: page objects for resilient browser UI tests
//!
//! A synchronous page-object layer over any WebDriver-style session. Pages
//! are written against the [`UiDriver`] trait; waits poll with a fixed
//! interval under an explicit timeout, clicks recover from interception and
//! staleness, and batch checks report every failing item at once.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  pages        FaqsPage  ProductTour  SupportPage  SignUpPage │
//! ├──────────────────────────────────────────────────────────────┤
//! │  accordion    verify     compare     timing     test_data    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  interaction (safe_click, safe_type, retry)                  │
//! │  wait        (Waiter, Condition, WaitOptions)                │
//! ├──────────────────────────────────────────────────────────────┤
//! │  driver (UiDriver)  ◄── MockDriver / your WebDriver adapter  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use pomkit::{safe_click, Locator, MockDriver, Selector, WaitOptions, Waiter};
//! use pomkit::mock::{ClickAction, MockElement};
//!
//! let driver = MockDriver::new();
//! let button = driver.add(MockElement::new("button").matching(Selector::css("#go")));
//! let panel = driver.add(MockElement::new("div").matching(Selector::css("#panel")).hidden());
//! driver.on_click(button, ClickAction::Show(panel));
//!
//! let waiter = Waiter::with_options(&driver, WaitOptions::new().with_timeout(200).with_poll_interval(5));
//! safe_click(&waiter, &Locator::css("#go"), "Go", 1).unwrap();
//! assert!(waiter.wait_for_visibility(&Locator::css("#panel")).is_ok());
//! ```

#![warn(missing_docs)]

/// Toggle/accordion state machine
pub mod accordion;
/// List comparison utilities
pub mod compare;
/// Runtime settings
pub mod config;
/// Driver capability consumed by every page
pub mod driver;
/// Safe click, safe type and bounded retry
pub mod interaction;
/// Locators and selectors
pub mod locator;
/// Tracing subscriber setup
pub mod logging;
/// In-memory driver for unit tests
pub mod mock;
pub mod pages;
mod result;
/// Random form data
pub mod test_data;
/// Load-time thresholds
pub mod timing;
/// Structural verification of page sections
pub mod verify;
/// Polling waits
pub mod wait;

pub use accordion::{
    Accordion, IconState, ItemToggle, Observation, ToggleFailure, ToggleFailures, ToggleOutcome,
    ToggleState, ToggleTarget,
};
pub use compare::{
    exact_order_match, get_duplicates, has_duplicates, list_missing, list_out_of_order,
    list_unexpected, trim_all, trim_each, verify_sequence, SequenceDiff,
};
pub use config::Settings;
pub use driver::{resolve_all, resolve_first, DriverResult, ElementHandle, UiDriver};
pub use interaction::{safe_click, safe_type, ClickTarget, RetryPolicy};
pub use locator::{Locator, Selector};
pub use logging::{init_json_tracing, init_tracing};
pub use mock::MockDriver;
pub use result::{DriverError, PomError, PomResult};
pub use test_data::{Seed, SignUpForm, TestDataGenerator};
pub use timing::{LoadKind, LoadReport, LoadThresholds, LoadTimer, Verdict};
pub use verify::{inspect_section, verify_section, SectionReport, SectionSpec};
pub use wait::{Condition, WaitOptions, Waiter};
