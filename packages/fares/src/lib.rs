//! Flight-Offer Extraction, Reconciliation & Price-Diff Engine
//!
//! Scrapes flight-search result pages through a pluggable browser session,
//! extracts validated flight records, reconciles the default-sorted and
//! cheapest-sorted views of one search into a single deduplicated dataset,
//! diffs it against the previously persisted snapshot, and alerts on
//! significant price drops.
//!
//! # Design Philosophy
//!
//! The presentation layer is unreliable and changes under you:
//!
//! - Locate containers adaptively, never by a pinned class name
//! - Accept records by content shape, not by position
//! - Neither view is a superset of the other; merge by flight identity
//! - Claim a price change only when both sides parse
//! - A failure local to one container, view, or query never aborts
//!   sibling work
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fares::{run_batch, EngineConfig, FsStore, TelegramNotifier, WebDriverBrowser};
//!
//! let store = Arc::new(FsStore::new("snapshots"));
//! let notifier = Arc::new(TelegramNotifier::from_env()?);
//! let totals = run_batch(
//!     urls,
//!     5,
//!     |_worker| WebDriverBrowser::connect("http://localhost:9515"),
//!     store,
//!     notifier,
//!     EngineConfig::default(),
//! )
//! .await;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (Browser, SnapshotStore, Notifier)
//! - [`types`] - Flight records, configuration, run reporting
//! - [`locator`] / [`extractor`] / [`reconcile`] / [`diff`] / [`assembly`] - The engine
//! - [`pipeline`] - Per-query orchestration and the batch worker pool
//! - [`browsers`] / [`stores`] / [`notify`] - Backend implementations
//! - [`testing`] - Scripted mocks

pub mod assembly;
pub mod browsers;
pub mod currency;
pub mod dates;
pub mod diff;
pub mod error;
pub mod extractor;
pub mod locator;
pub mod notify;
pub mod pipeline;
pub mod reconcile;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{EngineError, NotifyError, Result, SessionError, StoreError};
pub use traits::{
    browser::{Browser, Element, Query},
    notifier::Notifier,
    store::SnapshotStore,
};
pub use types::{
    config::EngineConfig,
    record::{FlightRecord, IdentityKey, RejectReason, NOT_AVAILABLE},
    report::{QueryOutcome, RunTotals},
};

// Re-export engine components
pub use assembly::{output_key, rank_by_min_price};
pub use currency::{min_known_price, parse_amount};
pub use dates::convert_date_with_smart_year;
pub use diff::{apply_price_changes, dispatch_alerts, PriceAlert};
pub use extractor::{apply_validation_gate, extract_record, extraction_budget, ExtractionContext};
pub use locator::{discover_container_class, is_candidate_class_token, locate_containers};
pub use reconcile::merge_views;

// Re-export pipeline entry points
pub use pipeline::{run_batch, run_query, DEFAULT_WORKERS};

// Re-export backends
pub use browsers::WebDriverBrowser;
pub use notify::{NoopNotifier, TelegramNotifier};
pub use stores::{FsStore, MemoryStore};

// Re-export testing utilities
pub use testing::{MockBrowser, MockElement, MockView, RecordingNotifier};
