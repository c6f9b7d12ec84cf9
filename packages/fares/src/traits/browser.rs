//! Browser-session collaborator interface.
//!
//! The engine never drives a browser directly; it consumes opaque element
//! handles it can query by selector and by text. Every operation may fail
//! with a timeout and none may crash the pipeline.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::SessionResult;

/// How to address elements: CSS selector or XPath expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl Query {
    /// CSS selector query.
    pub fn css(selector: impl Into<String>) -> Self {
        Query::Css(selector.into())
    }

    /// XPath expression query.
    pub fn xpath(expression: impl Into<String>) -> Self {
        Query::XPath(expression.into())
    }

    /// XPath locating any element containing the given visible text.
    pub fn containing_text(needle: &str) -> Self {
        Query::XPath(format!("//*[contains(text(), '{needle}')]"))
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::Css(s) => write!(f, "css:{s}"),
            Query::XPath(s) => write!(f, "xpath:{s}"),
        }
    }
}

/// An opaque handle to one element on the current page.
#[async_trait]
pub trait Element: Send + Sync {
    /// Visible text content of the element.
    async fn text(&self) -> SessionResult<String>;

    /// Attribute value, `None` when the attribute is absent.
    async fn attribute(&self, name: &str) -> SessionResult<Option<String>>;

    /// Query descendants (or XPath axes) relative to this element.
    async fn find_all(&self, query: &Query) -> SessionResult<Vec<Box<dyn Element>>>;

    /// Click the element.
    async fn click(&self) -> SessionResult<()>;

    /// Accessible label, the extractor's richest text source.
    async fn aria_label(&self) -> SessionResult<Option<String>> {
        self.attribute("aria-label").await
    }
}

/// One browser session owned by one worker for one query.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Navigate to a URL and wait for the initial load.
    async fn navigate(&self, url: &str) -> SessionResult<()>;

    /// All elements matching the query, in document order.
    async fn find_all(&self, query: &Query) -> SessionResult<Vec<Box<dyn Element>>>;

    /// First element matching the query, `NotFound` otherwise.
    async fn find_one(&self, query: &Query) -> SessionResult<Box<dyn Element>> {
        self.find_all(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| crate::error::SessionError::NotFound {
                query: query.to_string(),
            })
    }

    /// Execute a script in the page, returning its JSON result.
    async fn execute_script(&self, script: &str) -> SessionResult<serde_json::Value>;

    /// Tear down the session. Best-effort; defaults to a no-op.
    async fn close(&self) -> SessionResult<()> {
        Ok(())
    }

    /// Poll until the query matches something or the timeout elapses.
    ///
    /// Returns `false` on timeout; timeouts here are expected and
    /// non-fatal, the pipeline proceeds with whatever is present.
    async fn wait_for(&self, query: &Query, timeout: Duration) -> SessionResult<bool> {
        let interval = Duration::from_millis(200);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if !self.find_all(query).await?.is_empty() {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(interval.min(timeout)).await;
        }
    }
}
