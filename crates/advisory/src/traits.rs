use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("advisory server answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no answer within {0:?}")]
    Timeout(Duration),
}

/// A language model behind a prompt-in, text-out interface. Replies carry no
/// schema; callers own all parsing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    async fn ask(&self, prompt: &str, timeout: Duration) -> Result<String, AdvisoryError>;
}
