use std::path::{Path, PathBuf};

use anyhow::Context;
use common::models::OrderRecord;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Append-only JSON lines file of submitted orders.
pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, record: &OrderRecord) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(record).context("serializing order record")?;
        line.push('\n');

        // One writer at a time keeps lines whole.
        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening audit log {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("audit: {} {} {}", record.symbol, record.side, record.client_order_id);
        Ok(())
    }
}
