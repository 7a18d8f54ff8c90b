//! Page objects for the application screens under test.
//!
//! Each page owns its locators and a [`PageContext`]; methods are verbs a
//! scenario composes (click, wait, read, verify). Checks that answer "is
//! the screen ready" return `bool` and log every contributing signal;
//! assertions with a business meaning return [`crate::PomResult`].

mod base;
mod faqs;
mod product_tour;
mod signup;
mod support;

pub use base::{PageContext, PageObject};
pub use faqs::{FaqsLocators, FaqsPage};
pub use product_tour::{ProductTour, TourLocators, TOUR_HEADINGS};
pub use signup::{SignUpLocators, SignUpPage, WELCOME_URL_FRAGMENT};
pub use support::{SupportLocators, SupportPage, EXPECTED_HEADERS, URL_FRAGMENTS};
