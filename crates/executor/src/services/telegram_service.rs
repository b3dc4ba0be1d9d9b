use common::config::TelegramSettings;
use teloxide::prelude::*;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Telegram rejects longer texts.
const MAX_MESSAGE_CHARS: usize = 4096;

/// What the forwarder managed to hand over to Telegram.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub sent: usize,
    pub failed: usize,
    pub dropped: u64,
}

pub struct TelegramService {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramService {
    pub fn new(settings: &TelegramSettings) -> Self {
        Self {
            bot: Bot::new(settings.bot_token.clone()),
            chat_id: ChatId(settings.chat_id),
        }
    }

    /// Relays trading notifications to the configured chat until every
    /// notifier is gone. Failed sends are counted, not retried.
    pub async fn start(self, mut rx: broadcast::Receiver<String>) -> Delivery {
        info!("Relaying notifications to Telegram chat {}", self.chat_id.0);
        let mut delivery = Delivery::default();

        loop {
            let text = match rx.recv().await {
                Ok(text) => text,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Telegram relay fell behind, {} notifications dropped", n);
                    delivery.dropped += n;
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            for part in split_message(&text, MAX_MESSAGE_CHARS) {
                match self.bot.send_message(self.chat_id, part).await {
                    Ok(_) => delivery.sent += 1,
                    Err(e) => {
                        warn!("Telegram send failed: {}", e);
                        delivery.failed += 1;
                    }
                }
            }
        }

        info!(
            "Telegram relay stopped: {} sent, {} failed, {} dropped",
            delivery.sent, delivery.failed, delivery.dropped
        );
        delivery
    }
}

/// Splits `text` into parts of at most `max_chars` characters, preferring
/// line breaks as cut points.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in text.split_inclusive('\n') {
        let mut line = line;
        let mut line_chars = line.chars().count();

        if current_chars + line_chars > max_chars && current_chars > 0 {
            parts.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        // A single line longer than a whole message is cut at char boundaries.
        while line_chars > max_chars {
            let cut = line.char_indices().nth(max_chars).map_or(line.len(), |(i, _)| i);
            parts.push(line[..cut].to_string());
            line = &line[cut..];
            line_chars -= max_chars;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
