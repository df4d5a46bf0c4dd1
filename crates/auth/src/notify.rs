//! Outbound notification port (email/push).
//!
//! Notifications are best-effort: failures are logged by the caller and never
//! roll back the business operation that triggered them.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Welcome,
    EmailChangeCode,
    WorkspaceInvite,
}

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

pub trait Notifier: Send + Sync {
    fn send(
        &self,
        kind: NotificationKind,
        recipient: &str,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError>;
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn send(
        &self,
        kind: NotificationKind,
        recipient: &str,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        (**self).send(kind, recipient, payload)
    }
}

/// Fire-and-forget helper: delivery failures are logged at `warn` and
/// swallowed, per the best-effort contract.
pub fn send_best_effort(
    notifier: &dyn Notifier,
    kind: NotificationKind,
    recipient: &str,
    payload: serde_json::Value,
) {
    if let Err(e) = notifier.send(kind, recipient, payload) {
        tracing::warn!(?kind, recipient, error = %e, "notification delivery failed");
    }
}
