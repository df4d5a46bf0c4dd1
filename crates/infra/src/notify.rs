//! Notification channel adapter.

use stockroom_auth::{NotificationKind, Notifier, NotifyError};

/// Logs every notification instead of delivering it. Stands in for the real
/// email/push channel; deliveries are best-effort either way, so callers
/// never distinguish.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(
        &self,
        kind: NotificationKind,
        recipient: &str,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        tracing::info!(?kind, recipient, %payload, "notification dispatched");
        Ok(())
    }
}
