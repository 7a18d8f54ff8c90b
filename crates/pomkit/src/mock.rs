//! In-memory [`UiDriver`] for unit tests and dry runs.
//!
//! The mock keeps a small arena of nodes. Each node answers to one or more
//! selectors, may have a parent, and carries just enough state (text,
//! attributes, visibility, enabled flag, input value) to drive page objects
//! through realistic flows. Flaky behaviour is scripted per node:
//!
//! - deferred visibility changes after N `is_displayed` polls
//! - click interception by an overlay (forced clicks still land)
//! - one-shot staleness on the next click (the node is "rebuilt")
//! - click side effects such as toggling an accordion row or navigating

use crate::driver::{DriverResult, ElementHandle, UiDriver};
use crate::interaction::{FORCE_CLICK_SCRIPT, SCROLL_INTO_VIEW_SCRIPT};
use crate::locator::{Locator, Selector};
use crate::result::DriverError;
use std::cell::RefCell;
use std::collections::HashMap;

/// Index of a node in the mock tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Side effect applied when a node is clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Flip an accordion row: content visibility and icon asset
    ToggleAccordion {
        /// Content panel node
        content: NodeId,
        /// Icon node whose `src` alternates between plus and minus assets
        icon: NodeId,
    },
    /// Make a node visible
    Show(NodeId),
    /// Hide a node
    Hide(NodeId),
    /// Replace a node's text
    SetText(NodeId, String),
    /// Set an attribute on a node
    SetAttr(NodeId, String, String),
    /// Change the current URL
    Navigate(String),
    /// Copy the clicked node's text into another node
    CopyTextTo(NodeId),
}

/// Builder for a mock node
#[derive(Debug, Clone)]
pub struct MockElement {
    tag: String,
    selectors: Vec<Selector>,
    text: String,
    attributes: HashMap<String, String>,
    displayed: bool,
    enabled: bool,
}

impl MockElement {
    /// New visible, enabled node with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            selectors: Vec::new(),
            text: String::new(),
            attributes: HashMap::new(),
            displayed: true,
            enabled: true,
        }
    }

    /// Answer to `selector`
    #[must_use]
    pub fn matching(mut self, selector: Selector) -> Self {
        self.selectors.push(selector);
        self
    }

    /// Answer to the innermost step of `locator`
    #[must_use]
    pub fn matching_locator(mut self, locator: &Locator) -> Self {
        if let Some(step) = locator.steps().last() {
            self.selectors.push(step.selector.clone());
        }
        self
    }

    /// Set text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Start hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Start disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Debug)]
struct Node {
    spec: MockElement,
    parent: Option<usize>,
    generation: u32,
    removed: bool,
    intercepted: bool,
    stale_clicks: u32,
    blocked_clicks: u32,
    stale_reads: u32,
    pending_visibility: Option<(u32, bool)>,
    on_click: Vec<ClickAction>,
    clicks: u32,
}

#[derive(Debug, Default)]
struct MockState {
    nodes: Vec<Node>,
    url: String,
    history: Vec<String>,
    forced_clicks: u32,
    session_lost: bool,
}

/// Scriptable in-memory driver
#[derive(Debug, Default)]
pub struct MockDriver {
    state: RefCell<MockState>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock driver already "on" `url`
    #[must_use]
    pub fn at(url: impl Into<String>) -> Self {
        let driver = Self::new();
        driver.set_url(url);
        driver
    }

    /// Add a top-level node
    pub fn add(&self, element: MockElement) -> NodeId {
        self.insert(element, None)
    }

    /// Add a node under `parent`
    pub fn add_child(&self, parent: NodeId, element: MockElement) -> NodeId {
        self.insert(element, Some(parent.0))
    }

    fn insert(&self, element: MockElement, parent: Option<usize>) -> NodeId {
        let mut state = self.state.borrow_mut();
        state.nodes.push(Node {
            spec: element,
            parent,
            generation: 0,
            removed: false,
            intercepted: false,
            stale_clicks: 0,
            blocked_clicks: 0,
            stale_reads: 0,
            pending_visibility: None,
            on_click: Vec::new(),
            clicks: 0,
        });
        NodeId(state.nodes.len() - 1)
    }

    /// Register a click side effect
    pub fn on_click(&self, node: NodeId, action: ClickAction) {
        self.state.borrow_mut().nodes[node.0].on_click.push(action);
    }

    /// Native clicks on `node` are swallowed by an overlay
    pub fn intercept_clicks(&self, node: NodeId, intercepted: bool) {
        self.state.borrow_mut().nodes[node.0].intercepted = intercepted;
    }

    /// The next `times` clicks on `node` find it rebuilt (stale)
    pub fn stale_on_click(&self, node: NodeId, times: u32) {
        self.state.borrow_mut().nodes[node.0].stale_clicks = times;
    }

    /// The next `times` native clicks on `node` fail as not interactable
    pub fn not_interactable_on_click(&self, node: NodeId, times: u32) {
        self.state.borrow_mut().nodes[node.0].blocked_clicks = times;
    }

    /// The next `times` text reads of `node` find it rebuilt (stale)
    pub fn stale_on_text(&self, node: NodeId, times: u32) {
        self.state.borrow_mut().nodes[node.0].stale_reads = times;
    }

    /// After `polls` visibility checks, set `node` visibility to `visible`
    pub fn change_visibility_after(&self, node: NodeId, polls: u32, visible: bool) {
        let mut state = self.state.borrow_mut();
        if polls == 0 {
            state.nodes[node.0].spec.displayed = visible;
        } else {
            state.nodes[node.0].pending_visibility = Some((polls, visible));
        }
    }

    /// Set node visibility immediately
    pub fn set_displayed(&self, node: NodeId, visible: bool) {
        self.state.borrow_mut().nodes[node.0].spec.displayed = visible;
    }

    /// Set node enabled flag
    pub fn set_enabled(&self, node: NodeId, enabled: bool) {
        self.state.borrow_mut().nodes[node.0].spec.enabled = enabled;
    }

    /// Replace node text
    pub fn set_text(&self, node: NodeId, text: impl Into<String>) {
        self.state.borrow_mut().nodes[node.0].spec.text = text.into();
    }

    /// Set an attribute on a node
    pub fn set_attr(&self, node: NodeId, name: &str, value: impl Into<String>) {
        self.state.borrow_mut().nodes[node.0]
            .spec
            .attributes
            .insert(name.to_string(), value.into());
    }

    /// Rebuild `node`: existing handles to it go stale
    pub fn rebuild(&self, node: NodeId) {
        self.state.borrow_mut().nodes[node.0].generation += 1;
    }

    /// Detach `node` (and its subtree) from the document
    pub fn remove(&self, node: NodeId) {
        self.state.borrow_mut().nodes[node.0].removed = true;
    }

    /// Change the current URL
    pub fn set_url(&self, url: impl Into<String>) {
        self.state.borrow_mut().url = url.into();
    }

    /// Every subsequent call fails with a session error
    pub fn lose_session(&self) {
        self.state.borrow_mut().session_lost = true;
    }

    /// Number of clicks that registered on `node` (native or forced)
    #[must_use]
    pub fn click_count(&self, node: NodeId) -> u32 {
        self.state.borrow().nodes[node.0].clicks
    }

    /// Number of forced (script) clicks performed
    #[must_use]
    pub fn forced_click_count(&self) -> u32 {
        self.state.borrow().forced_clicks
    }

    /// Whether `node` is currently visible
    #[must_use]
    pub fn displayed(&self, node: NodeId) -> bool {
        self.state.borrow().nodes[node.0].spec.displayed
    }

    /// Current text of `node`
    #[must_use]
    pub fn node_text(&self, node: NodeId) -> String {
        self.state.borrow().nodes[node.0].spec.text.clone()
    }

    /// Current value of an attribute on `node`
    #[must_use]
    pub fn node_attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.state.borrow().nodes[node.0]
            .spec
            .attributes
            .get(name)
            .cloned()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state
            .borrow()
            .history
            .iter()
            .any(|c| c.starts_with(method))
    }
}

fn handle_for(index: usize, generation: u32) -> ElementHandle {
    ElementHandle::new(format!("n{index}g{generation}"))
}

fn parse_handle(handle: &ElementHandle) -> Option<(usize, u32)> {
    let rest = handle.id.strip_prefix('n')?;
    let (idx, gen) = rest.split_once('g')?;
    Some((idx.parse().ok()?, gen.parse().ok()?))
}

impl MockState {
    fn check_session(&self) -> DriverResult<()> {
        if self.session_lost {
            return Err(DriverError::session("session closed"));
        }
        Ok(())
    }

    fn is_attached(&self, index: usize) -> bool {
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            if self.nodes[i].removed {
                return false;
            }
            cursor = self.nodes[i].parent;
        }
        true
    }

    fn live(&self, handle: &ElementHandle) -> DriverResult<usize> {
        self.check_session()?;
        let (index, generation) = parse_handle(handle)
            .filter(|(i, _)| *i < self.nodes.len())
            .ok_or_else(|| DriverError::no_such_element(handle.id.clone()))?;
        if self.nodes[index].generation != generation || !self.is_attached(index) {
            return Err(DriverError::stale(handle.id.clone()));
        }
        Ok(index)
    }

    fn matches(&self, index: usize, selector: &Selector) -> bool {
        let node = &self.nodes[index];
        match selector {
            Selector::Text(t) => {
                node.spec.text.split_whitespace().collect::<Vec<_>>().join(" ") == *t
                    || node.spec.selectors.contains(selector)
            }
            _ => node.spec.selectors.contains(selector),
        }
    }

    fn is_descendant(&self, index: usize, ancestor: usize) -> bool {
        let mut cursor = self.nodes[index].parent;
        while let Some(i) = cursor {
            if i == ancestor {
                return true;
            }
            cursor = self.nodes[i].parent;
        }
        false
    }

    fn find(&self, selector: &Selector, within: Option<usize>) -> Vec<ElementHandle> {
        (0..self.nodes.len())
            .filter(|&i| self.is_attached(i))
            .filter(|&i| within.map_or(true, |p| self.is_descendant(i, p)))
            .filter(|&i| self.matches(i, selector))
            .map(|i| handle_for(i, self.nodes[i].generation))
            .collect()
    }

    fn register_click(&mut self, index: usize) {
        self.nodes[index].clicks += 1;
        let actions = self.nodes[index].on_click.clone();
        for action in actions {
            match action {
                ClickAction::ToggleAccordion { content, icon } => {
                    let now_visible = !self.nodes[content.0].spec.displayed;
                    self.nodes[content.0].spec.displayed = now_visible;
                    let src = if now_visible {
                        "/assets/icons/minus.svg"
                    } else {
                        "/assets/icons/plus.svg"
                    };
                    self.nodes[icon.0]
                        .spec
                        .attributes
                        .insert("src".to_string(), src.to_string());
                }
                ClickAction::Show(node) => self.nodes[node.0].spec.displayed = true,
                ClickAction::Hide(node) => self.nodes[node.0].spec.displayed = false,
                ClickAction::SetText(node, text) => self.nodes[node.0].spec.text = text,
                ClickAction::SetAttr(node, name, value) => {
                    self.nodes[node.0].spec.attributes.insert(name, value);
                }
                ClickAction::Navigate(url) => self.url = url,
                ClickAction::CopyTextTo(node) => {
                    let text = self.nodes[index].spec.text.trim().to_string();
                    self.nodes[node.0].spec.text = text;
                }
            }
        }
    }
}

impl UiDriver for MockDriver {
    fn find_all(&self, selector: &Selector) -> DriverResult<Vec<ElementHandle>> {
        let mut state = self.state.borrow_mut();
        state.check_session()?;
        state.history.push(format!("find_all:{selector}"));
        Ok(state.find(selector, None))
    }

    fn find_within(
        &self,
        parent: &ElementHandle,
        selector: &Selector,
    ) -> DriverResult<Vec<ElementHandle>> {
        let state = self.state.borrow();
        let index = state.live(parent)?;
        Ok(state.find(selector, Some(index)))
    }

    fn text(&self, element: &ElementHandle) -> DriverResult<String> {
        let mut state = self.state.borrow_mut();
        let index = state.live(element)?;
        let node = &mut state.nodes[index];
        if node.stale_reads > 0 {
            node.stale_reads -= 1;
            node.generation += 1;
            return Err(DriverError::stale(element.id.clone()));
        }
        if !node.spec.displayed {
            return Ok(String::new());
        }
        Ok(node.spec.text.clone())
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        let state = self.state.borrow();
        let index = state.live(element)?;
        Ok(state.nodes[index].spec.attributes.get(name).cloned())
    }

    fn is_displayed(&self, element: &ElementHandle) -> DriverResult<bool> {
        let mut state = self.state.borrow_mut();
        let index = state.live(element)?;
        let node = &mut state.nodes[index];
        if let Some((remaining, visible)) = node.pending_visibility {
            if remaining <= 1 {
                node.spec.displayed = visible;
                node.pending_visibility = None;
            } else {
                node.pending_visibility = Some((remaining - 1, visible));
            }
        }
        Ok(node.spec.displayed)
    }

    fn is_enabled(&self, element: &ElementHandle) -> DriverResult<bool> {
        let state = self.state.borrow();
        let index = state.live(element)?;
        Ok(state.nodes[index].spec.enabled)
    }

    fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        let mut state = self.state.borrow_mut();
        let index = state.live(element)?;
        state.history.push(format!("click:{}", element.id));

        if state.nodes[index].stale_clicks > 0 {
            state.nodes[index].stale_clicks -= 1;
            state.nodes[index].generation += 1;
            return Err(DriverError::stale(element.id.clone()));
        }
        if state.nodes[index].blocked_clicks > 0 {
            state.nodes[index].blocked_clicks -= 1;
            return Err(DriverError::not_interactable(format!(
                "{} is not ready for input",
                element.id
            )));
        }
        if !state.nodes[index].spec.displayed || !state.nodes[index].spec.enabled {
            return Err(DriverError::not_interactable(element.id.clone()));
        }
        if state.nodes[index].intercepted {
            return Err(DriverError::intercepted(format!(
                "{} is covered by another element",
                element.id
            )));
        }
        state.register_click(index);
        Ok(())
    }

    fn send_keys(&self, element: &ElementHandle, text: &str) -> DriverResult<()> {
        let mut state = self.state.borrow_mut();
        let index = state.live(element)?;
        state.history.push(format!("send_keys:{}:{text}", element.id));
        if !state.nodes[index].spec.enabled {
            return Err(DriverError::not_interactable(element.id.clone()));
        }
        let value = state.nodes[index]
            .spec
            .attributes
            .entry("value".to_string())
            .or_default();
        value.push_str(text);
        Ok(())
    }

    fn clear(&self, element: &ElementHandle) -> DriverResult<()> {
        let mut state = self.state.borrow_mut();
        let index = state.live(element)?;
        state.history.push(format!("clear:{}", element.id));
        state.nodes[index]
            .spec
            .attributes
            .insert("value".to_string(), String::new());
        Ok(())
    }

    fn execute_script(
        &self,
        script: &str,
        args: &[ElementHandle],
    ) -> DriverResult<serde_json::Value> {
        let mut state = self.state.borrow_mut();
        state.check_session()?;

        if script == FORCE_CLICK_SCRIPT {
            let target = args
                .first()
                .ok_or_else(|| DriverError::script("force click needs an element"))?;
            let index = state.live(target)?;
            state.history.push(format!("script:force_click:{}", target.id));
            state.forced_clicks += 1;
            state.register_click(index);
            return Ok(serde_json::Value::Null);
        }
        if script == SCROLL_INTO_VIEW_SCRIPT {
            if let Some(target) = args.first() {
                state.live(target)?;
                state.history.push(format!("script:scroll:{}", target.id));
            }
            return Ok(serde_json::Value::Null);
        }

        state.history.push("script:custom".to_string());
        Ok(serde_json::Value::Null)
    }

    fn current_url(&self) -> DriverResult<String> {
        let state = self.state.borrow();
        state.check_session()?;
        Ok(state.url.clone())
    }

    fn tag_name(&self, element: &ElementHandle) -> DriverResult<String> {
        let state = self.state.borrow();
        let index = state.live(element)?;
        Ok(state.nodes[index].spec.tag.to_lowercase())
    }
}
