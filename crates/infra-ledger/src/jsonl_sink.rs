// JSON-lines LedgerSink Implementation
//
// One completed entry per line. The exporter delivers at-least-once, so ids
// already present in the file are skipped instead of written twice.

use async_trait::async_trait;
use photoqueue_core::domain::{EntryId, QueueEntry};
use photoqueue_core::port::{LedgerError, LedgerSink};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    /// RFC 3339 time the row was written
    pub exported_at: String,
    pub entry: QueueEntry,
}

struct LedgerFile {
    file: File,
    exported: HashSet<EntryId>,
    /// Last line on disk is unterminated (torn write); start the next on a fresh line
    torn_tail: bool,
}

pub struct JsonlLedgerSink {
    path: PathBuf,
    inner: Mutex<LedgerFile>,
}

impl JsonlLedgerSink {
    /// Open (or create) the ledger file and index the ids already in it
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let (exported, torn_tail) = match fs::read_to_string(&path).await {
            Ok(content) => (
                index_ids(&path, &content),
                !content.is_empty() && !content.ends_with('\n'),
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (HashSet::new(), false),
            Err(e) => return Err(e.into()),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        info!(
            path = %path.display(),
            existing = exported.len(),
            torn_tail,
            "Ledger file opened"
        );

        Ok(Self {
            path,
            inner: Mutex::new(LedgerFile {
                file,
                exported,
                torn_tail,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct entries recorded so far
    pub async fn len(&self) -> usize {
        self.inner.lock().await.exported.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn index_ids(path: &Path, content: &str) -> HashSet<EntryId> {
    let mut ids = HashSet::new();
    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LedgerRecord>(line) {
            Ok(record) => {
                ids.insert(record.entry.id);
            }
            Err(e) => warn!(
                path = %path.display(),
                line = n + 1,
                error = %e,
                "Skipping unreadable ledger line"
            ),
        }
    }
    ids
}

#[async_trait]
impl LedgerSink for JsonlLedgerSink {
    async fn append(&self, entry: &QueueEntry) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().await;
        if inner.exported.contains(&entry.id) {
            debug!(entry_id = %entry.id, "Entry already in ledger");
            return Ok(());
        }

        let record = LedgerRecord {
            exported_at: chrono::Utc::now().to_rfc3339(),
            entry: entry.clone(),
        };
        let mut line = String::new();
        if inner.torn_tail {
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(&record)?);
        line.push('\n');

        // A failed write may leave part of the line behind
        let written = inner.file.write_all(line.as_bytes()).await;
        let flushed = match written {
            Ok(()) => inner.file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = flushed {
            warn!(entry_id = %entry.id, error = %e, "Ledger write failed");
            inner.torn_tail = true;
            return Err(e.into());
        }

        inner.torn_tail = false;
        inner.exported.insert(entry.id.clone());
        Ok(())
    }
}
