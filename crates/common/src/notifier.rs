use tokio::sync::broadcast;
use tracing::info;

/// Best-effort delivery of human readable status messages.
///
/// Implementations must not block and must never report failure to the
/// caller: a lost notification cannot change the outcome of a cycle.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: String);
}

/// Logs each message and fans it out to whoever listens on the channel
/// (the Telegram service in production). No listener is not an error.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<String>,
}

impl ChannelNotifier {
    pub fn new(tx: broadcast::Sender<String>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: String) {
        info!(target: "audit", "{}", message);
        let _ = self.tx.send(message);
    }
}
