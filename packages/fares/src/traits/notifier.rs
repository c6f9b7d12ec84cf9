//! Notification-transport collaborator interface.

use async_trait::async_trait;

use crate::error::NotifyResult;

/// Outbound alert transport.
///
/// Dispatch failures are logged by callers and never abort the run.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one text message.
    async fn send(&self, message: &str) -> NotifyResult<()>;
}
