//! UiDriver - abstract UI automation capability
//!
//! Page objects never talk to a browser directly. Everything they need from
//! the outside world goes through [`UiDriver`], a small synchronous trait
//! modelled on the WebDriver element API. A WebDriver client, a CDP bridge
//! or the in-memory [`MockDriver`](crate::mock::MockDriver) can sit behind it.
//!
//! ```text
//! ┌──────────────┐   Locator    ┌──────────────┐   ElementHandle   ┌───────────┐
//! │  Page object │ ───────────► │ resolve_all  │ ────────────────► │ UiDriver  │
//! │  (stable)    │              │ (per call)   │   (transient)     │ (session) │
//! └──────────────┘              └──────────────┘                   └───────────┘
//! ```

use crate::locator::{Locator, Selector};
use crate::result::DriverError;
use serde::{Deserialize, Serialize};

/// Driver-level result
pub type DriverResult<T> = Result<T, DriverError>;

/// Time-bound reference to a concrete node in the UI tree.
///
/// A handle goes stale as soon as the tree is rebuilt. Callers that need to
/// look at the same logical element again should re-resolve its [`Locator`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned element identifier
    pub id: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "element#{}", self.id)
    }
}

/// Synchronous UI automation driver.
///
/// One driver represents one session; page objects use it exclusively and
/// sequentially. Methods take `&self` because a session is a handle to
/// remote state, not owned data.
pub trait UiDriver {
    /// All elements matching `selector` in the document, in document order
    fn find_all(&self, selector: &Selector) -> DriverResult<Vec<ElementHandle>>;

    /// All descendants of `parent` matching `selector`, in document order
    fn find_within(
        &self,
        parent: &ElementHandle,
        selector: &Selector,
    ) -> DriverResult<Vec<ElementHandle>>;

    /// Rendered text of the element
    fn text(&self, element: &ElementHandle) -> DriverResult<String>;

    /// Attribute or property value, `None` when absent
    fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>>;

    /// Whether the element is rendered and visible
    fn is_displayed(&self, element: &ElementHandle) -> DriverResult<bool>;

    /// Whether the element accepts input
    fn is_enabled(&self, element: &ElementHandle) -> DriverResult<bool>;

    /// Native click
    fn click(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Type into the element
    fn send_keys(&self, element: &ElementHandle, text: &str) -> DriverResult<()>;

    /// Clear an input element
    fn clear(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Run a script in the page; `args` are exposed as `arguments[i]`
    fn execute_script(&self, script: &str, args: &[ElementHandle])
        -> DriverResult<serde_json::Value>;

    /// URL of the current page
    fn current_url(&self) -> DriverResult<String>;

    /// Lower-case tag name of the element
    fn tag_name(&self, element: &ElementHandle) -> DriverResult<String>;
}

/// Resolve every element addressed by `locator`.
///
/// Each chain step is applied to the matches of the previous step, then
/// narrowed by its `nth` index when present. An index past the end yields an
/// empty result rather than an error.
pub fn resolve_all<D: UiDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
) -> DriverResult<Vec<ElementHandle>> {
    let mut current: Option<Vec<ElementHandle>> = None;

    for step in locator.steps() {
        let mut found = match current {
            None => driver.find_all(&step.selector)?,
            Some(parents) => {
                let mut acc = Vec::new();
                for parent in &parents {
                    acc.extend(driver.find_within(parent, &step.selector)?);
                }
                acc
            }
        };
        if let Some(n) = step.nth {
            found = found.into_iter().nth(n).into_iter().collect();
        }
        if found.is_empty() {
            return Ok(found);
        }
        current = Some(found);
    }

    Ok(current.unwrap_or_default())
}

/// Resolve the first element addressed by `locator`
pub fn resolve_first<D: UiDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
) -> DriverResult<ElementHandle> {
    resolve_all(driver, locator)?
        .into_iter()
        .next()
        .ok_or_else(|| DriverError::no_such_element(locator.to_string()))
}

/// Read the trimmed text of every element addressed by `locator`
pub fn texts_of<D: UiDriver + ?Sized>(driver: &D, locator: &Locator) -> DriverResult<Vec<String>> {
    resolve_all(driver, locator)?
        .iter()
        .map(|el| driver.text(el).map(|t| t.trim().to_string()))
        .collect()
}

/// Count elements addressed by `locator`, treating driver errors as zero
pub fn count_of<D: UiDriver + ?Sized>(driver: &D, locator: &Locator) -> usize {
    resolve_all(driver, locator).map_or(0, |v| v.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};

    fn list_fixture() -> MockDriver {
        let driver = MockDriver::new();
        let list = driver.add(MockElement::new("ul").matching(Selector::css("ul.topics")));
        for label in ["Compliance", "GST", "Payroll"] {
            let li = driver.add_child(list, MockElement::new("li").matching(Selector::css("li")));
            driver.add_child(
                li,
                MockElement::new("p")
                    .matching(Selector::css("p"))
                    .text(format!("  {label} ")),
            );
        }
        driver
    }

    #[test]
    fn test_element_handle_display() {
        assert_eq!(ElementHandle::new("n1g0").to_string(), "element#n1g0");
    }

    #[test]
    fn test_resolve_all_single_step() {
        let driver = list_fixture();
        let items = resolve_all(&driver, &Locator::css("li")).unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_resolve_chain_with_nth() {
        let driver = list_fixture();
        let loc = Locator::css("li").nth(1).child(&Locator::css("p"));
        let el = resolve_first(&driver, &loc).unwrap();
        assert_eq!(driver.text(&el).unwrap().trim(), "GST");
    }

    #[test]
    fn test_resolve_nth_out_of_range_is_empty() {
        let driver = list_fixture();
        let loc = Locator::css("li").nth(9).child(&Locator::css("p"));
        assert!(resolve_all(&driver, &loc).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_first_missing() {
        let driver = list_fixture();
        let err = resolve_first(&driver, &Locator::css("table")).unwrap_err();
        assert!(matches!(err, DriverError::NoSuchElement { .. }));
    }

    #[test]
    fn test_texts_of_trims() {
        let driver = list_fixture();
        let texts = texts_of(&driver, &Locator::css("p")).unwrap();
        assert_eq!(texts, vec!["Compliance", "GST", "Payroll"]);
    }

    #[test]
    fn test_count_of() {
        let driver = list_fixture();
        assert_eq!(count_of(&driver, &Locator::css("li")), 3);
        assert_eq!(count_of(&driver, &Locator::css("nope")), 0);
    }
}
