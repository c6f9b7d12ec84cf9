//! Testing utilities including mock implementations.
//!
//! Useful for exercising the engine without a live browser or network:
//! a scripted multi-view browser (clicking a marked element advances to
//! the next view, which is how the "Cheapest" toggle is simulated) and a
//! recording notifier.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::{NotifyError, NotifyResult, SessionResult};
use crate::traits::browser::{Browser, Element, Query};
use crate::traits::notifier::Notifier;

/// A scripted element: text, attributes, relative query responses, and
/// whether clicking it advances the browser to its next view.
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    text: String,
    attributes: HashMap<String, String>,
    children: HashMap<String, Vec<MockElement>>,
    advances_view: bool,
}

impl MockElement {
    /// Create an empty element.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the visible text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Script the response to a relative query on this element.
    pub fn with_child(mut self, query: Query, children: Vec<MockElement>) -> Self {
        self.children.insert(query.to_string(), children);
        self
    }

    /// Mark this element as a view toggle: clicking it advances the
    /// owning browser to its next scripted view.
    pub fn advances_view(mut self) -> Self {
        self.advances_view = true;
        self
    }

    /// A flight-offer container with an accessible label and visible text.
    pub fn flight_offer(aria_label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new()
            .with_text(text)
            .with_attribute("aria-label", aria_label)
    }

    /// Wrap into a standalone handle, detached from any browser.
    pub fn into_handle(self) -> MockHandle {
        MockHandle {
            spec: self,
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Runtime handle for a scripted element.
pub struct MockHandle {
    spec: MockElement,
    cursor: Arc<AtomicUsize>,
}

#[async_trait]
impl Element for MockHandle {
    async fn text(&self) -> SessionResult<String> {
        Ok(self.spec.text.clone())
    }

    async fn attribute(&self, name: &str) -> SessionResult<Option<String>> {
        Ok(self.spec.attributes.get(name).cloned())
    }

    async fn find_all(&self, query: &Query) -> SessionResult<Vec<Box<dyn Element>>> {
        let children = self
            .spec
            .children
            .get(&query.to_string())
            .cloned()
            .unwrap_or_default();
        Ok(children
            .into_iter()
            .map(|spec| {
                Box::new(MockHandle {
                    spec,
                    cursor: Arc::clone(&self.cursor),
                }) as Box<dyn Element>
            })
            .collect())
    }

    async fn click(&self) -> SessionResult<()> {
        if self.spec.advances_view {
            self.cursor.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// One scripted page state: query string → elements returned.
#[derive(Debug, Clone, Default)]
pub struct MockView {
    responses: HashMap<String, Vec<MockElement>>,
}

impl MockView {
    /// Script the response to a query in this view.
    pub fn on(&mut self, query: Query, elements: Vec<MockElement>) -> &mut Self {
        self.responses.insert(query.to_string(), elements);
        self
    }
}

/// A scripted browser session over a sequence of views.
///
/// Queries answer from the current view; clicking an element built with
/// [`MockElement::advances_view`] moves to the next one (the last view is
/// sticky). Navigations are recorded for assertions.
pub struct MockBrowser {
    views: Vec<MockView>,
    cursor: Arc<AtomicUsize>,
    navigations: Arc<RwLock<Vec<String>>>,
    script_result: serde_json::Value,
}

impl MockBrowser {
    /// Create a browser over pre-built views.
    pub fn new(views: Vec<MockView>) -> Self {
        Self {
            views,
            cursor: Arc::new(AtomicUsize::new(0)),
            navigations: Arc::new(RwLock::new(Vec::new())),
            script_result: serde_json::json!(1080),
        }
    }

    /// Convenience constructor for a single scripted view.
    pub fn single_view(build: impl FnOnce(&mut MockView)) -> Self {
        let mut view = MockView::default();
        build(&mut view);
        Self::new(vec![view])
    }

    /// Append another scripted view (builder pattern).
    pub fn with_view(mut self, build: impl FnOnce(&mut MockView)) -> Self {
        let mut view = MockView::default();
        build(&mut view);
        self.views.push(view);
        self
    }

    /// Fix the value every script execution returns.
    pub fn with_script_result(mut self, value: serde_json::Value) -> Self {
        self.script_result = value;
        self
    }

    /// URLs passed to `navigate`, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.read().unwrap().clone()
    }

    /// Index of the view currently being served.
    pub fn current_view(&self) -> usize {
        self.cursor
            .load(Ordering::SeqCst)
            .min(self.views.len().saturating_sub(1))
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn navigate(&self, url: &str) -> SessionResult<()> {
        self.navigations.write().unwrap().push(url.to_string());
        Ok(())
    }

    async fn find_all(&self, query: &Query) -> SessionResult<Vec<Box<dyn Element>>> {
        let Some(view) = self.views.get(self.current_view()) else {
            return Ok(Vec::new());
        };
        let specs = view
            .responses
            .get(&query.to_string())
            .cloned()
            .unwrap_or_default();
        Ok(specs
            .into_iter()
            .map(|spec| {
                Box::new(MockHandle {
                    spec,
                    cursor: Arc::clone(&self.cursor),
                }) as Box<dyn Element>
            })
            .collect())
    }

    async fn execute_script(&self, _script: &str) -> SessionResult<serde_json::Value> {
        Ok(self.script_result.clone())
    }
}

/// A notifier that records messages, optionally failing the first N sends.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<String>>>,
    failures_remaining: Arc<AtomicUsize>,
}

impl RecordingNotifier {
    /// Create a notifier that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` sends before accepting the rest.
    pub fn fail_first(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> NotifyResult<()> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(NotifyError::Dispatch("scripted failure".into()));
        }
        self.sent.write().unwrap().push(message.to_string());
        Ok(())
    }
}
