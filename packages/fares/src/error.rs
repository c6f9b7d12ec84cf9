//! Typed errors for the fares engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Per-record validation
//! rejections and missing snapshots are not errors; they are expected
//! states handled inline by the pipeline.

use thiserror::Error;

/// Errors that can occur while running a query pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Both locator tiers exhausted; the current view has no offers
    #[error("no flight containers found after {strategies_tried} strategies")]
    NoContainersFound { strategies_tried: usize },

    /// URL does not reference the expected search provider
    #[error("unsupported search URL: {url}")]
    UnsupportedUrl { url: String },

    /// Browser session failed
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Snapshot write failed; the query is marked unsuccessful
    #[error("snapshot persistence failed for {key}: {source}")]
    Persistence {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Snapshot payload could not be encoded
    #[error("snapshot encode error: {0}")]
    SnapshotEncode(#[from] serde_json::Error),
}

/// Errors surfaced by a browser session or an element handle.
///
/// Every browser operation may time out; none may crash the pipeline.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Bounded wait elapsed without the condition holding
    #[error("timeout waiting for {what}")]
    Timeout { what: String },

    /// A required element could not be located
    #[error("element not found: {query}")]
    NotFound { query: String },

    /// Transport-level failure talking to the automation backend
    #[error("browser transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// In-page script execution failed
    #[error("script execution failed: {0}")]
    Script(String),
}

/// Errors from a snapshot storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend-specific failure (filesystem, object store, ...)
    #[error("snapshot store error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from a notification transport.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The transport rejected or failed to deliver the message
    #[error("notification dispatch failed: {0}")]
    Dispatch(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The transport is not configured; message intentionally skipped
    #[error("notifier not configured: {reason}")]
    NotConfigured { reason: String },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Result type alias for browser session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Result type alias for snapshot store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for notification operations.
pub type NotifyResult<T> = std::result::Result<T, NotifyError>;
