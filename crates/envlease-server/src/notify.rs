//! Out-of-band delivery of watcher notifications.
//!
//! The coordinator calls [`NotificationDispatcher::notify`] after it has
//! released the resource lock, once per watcher, from one thread per
//! watcher, so implementations must tolerate concurrent calls. The caller's
//! response still waits for the slowest delivery: the webhook dispatcher
//! hands the request to a spawned tokio task and returns immediately. A returned error is logged by the
//! coordinator and otherwise ignored; it never undoes a committed transition.

use std::sync::Mutex;

use envlease_core::UserId;

/// Errors from handing a notification to its transport.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("no async runtime available to deliver notification")]
    NoRuntime,

    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: UserId, reason: String },
}

/// Delivers a message to one identity.
pub trait NotificationDispatcher: Send + Sync {
    fn notify(&self, recipient: &UserId, message: &str) -> Result<(), NotifyError>;
}

/// Logs each notification at info level. The default when no webhook is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationDispatcher for TracingNotifier {
    fn notify(&self, recipient: &UserId, message: &str) -> Result<(), NotifyError> {
        tracing::info!(recipient = %recipient, "notify: {}", message);
        Ok(())
    }
}

/// POSTs `{"recipient": ..., "message": ...}` to a fixed URL.
///
/// Delivery is fire-and-forget on the tokio runtime that was current when
/// the notifier was built, or else the caller's. That lets plain threads,
/// such as the coordinator's per-watcher dispatch threads, use it. Failures
/// inside the spawned task are logged at warn level.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    runtime: Option<tokio::runtime::Handle>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        WebhookNotifier {
            client: reqwest::Client::new(),
            url: url.into(),
            runtime: tokio::runtime::Handle::try_current().ok(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl NotificationDispatcher for WebhookNotifier {
    fn notify(&self, recipient: &UserId, message: &str) -> Result<(), NotifyError> {
        let handle = match &self.runtime {
            Some(handle) => handle.clone(),
            None => tokio::runtime::Handle::try_current().map_err(|_| NotifyError::NoRuntime)?,
        };

        let request = self.client.post(&self.url).json(&serde_json::json!({
            "recipient": recipient,
            "message": message,
        }));
        let recipient = recipient.clone();

        handle.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(recipient = %recipient, "webhook notification delivered");
                }
                Ok(response) => {
                    tracing::warn!(
                        recipient = %recipient,
                        status = %response.status(),
                        "webhook notification rejected"
                    );
                }
                Err(err) => {
                    tracing::warn!(recipient = %recipient, "webhook notification failed: {}", err);
                }
            }
        });

        Ok(())
    }
}

/// One delivered notification, as seen by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: UserId,
    pub message: String,
}

/// Collects every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in delivery order.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Messages delivered to `recipient`.
    pub fn messages_for(&self, recipient: &UserId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|n| &n.recipient == recipient)
            .map(|n| n.message.clone())
            .collect()
    }

    /// Drains and returns everything recorded.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl NotificationDispatcher for RecordingNotifier {
    fn notify(&self, recipient: &UserId, message: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Notification {
                recipient: recipient.clone(),
                message: message.to_string(),
            });
        Ok(())
    }
}
