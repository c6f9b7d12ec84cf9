//! Collaborator trait abstractions (browser session, snapshot store,
//! notification transport).

pub mod browser;
pub mod notifier;
pub mod store;

pub use browser::{Browser, Element, Query};
pub use notifier::Notifier;
pub use store::SnapshotStore;
