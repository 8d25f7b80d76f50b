use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use super::context::{ActionContext, OutcomeContext, UsageLogEntry};
use super::traits::Hook;

const DEFAULT_RETENTION_DAYS: u64 = 30;
const LOG_EXTENSION: &str = "jsonl";

/// Appends one JSON line per metered action to `<log_dir>/<session>.jsonl`
pub struct FileLoggerHook {
    log_dir: PathBuf,
    retention_days: u64,
    /// Appends and prunes never interleave on the same file
    io_lock: Mutex<()>,
}

/// Result of a retention pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub entries_kept: usize,
    pub entries_dropped: usize,
    pub files_removed: usize,
}

impl FileLoggerHook {
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            log_dir,
            retention_days: DEFAULT_RETENTION_DAYS,
            io_lock: Mutex::new(()),
        }
    }

    pub fn with_retention_days(mut self, days: u64) -> Self {
        self.retention_days = days;
        self
    }

    fn session_log_path(&self, ctx: &ActionContext) -> PathBuf {
        self.log_dir
            .join(ctx.short_session_id())
            .with_extension(LOG_EXTENSION)
    }

    async fn append(&self, path: &Path, entry: &UsageLogEntry) -> std::io::Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.io_lock.lock().await;
        tokio::fs::create_dir_all(&self.log_dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    /// Drop entries whose `timestamp` is past the retention period.
    /// A session file left with no entries is deleted.
    pub async fn prune(&self) -> PruneReport {
        let cutoff = (chrono::Utc::now() - chrono::Duration::days(self.retention_days as i64)).timestamp();
        let mut report = PruneReport::default();

        let _guard = self.io_lock.lock().await;
        let mut dir = match tokio::fs::read_dir(&self.log_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                tracing::debug!("No usage log directory to prune: {}", e);
                return report;
            }
        };

        while let Ok(Some(item)) = dir.next_entry().await {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }

            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Skipping unreadable usage log {:?}: {}", path, e);
                    continue;
                }
            };

            let total = content.lines().filter(|l| !l.trim().is_empty()).count();
            let kept: Vec<&str> = content
                .lines()
                .filter(|line| {
                    serde_json::from_str::<UsageLogEntry>(line)
                        .map(|entry| entry.timestamp >= cutoff)
                        .unwrap_or(false)
                })
                .collect();

            report.entries_kept += kept.len();
            report.entries_dropped += total - kept.len();
            if kept.len() == total {
                continue;
            }

            let result = if kept.is_empty() {
                report.files_removed += 1;
                tokio::fs::remove_file(&path).await
            } else {
                let mut rewritten = kept.join("\n");
                rewritten.push('\n');
                tokio::fs::write(&path, rewritten).await
            };
            if let Err(e) = result {
                tracing::warn!("Failed to prune usage log {:?}: {}", path, e);
            }
        }

        if report.entries_dropped > 0 {
            tracing::info!(
                "Usage log retention ({} days): dropped {} entries, removed {} files",
                self.retention_days,
                report.entries_dropped,
                report.files_removed
            );
        }
        report
    }
}

#[async_trait]
impl Hook for FileLoggerHook {
    async fn on_action_complete(&self, ctx: &ActionContext, outcome: &OutcomeContext) {
        let path = self.session_log_path(ctx);
        let entry = UsageLogEntry::from_contexts(ctx, outcome);

        match self.append(&path, &entry).await {
            Ok(()) => tracing::debug!("Usage logged: {} -> {:?}", ctx.action, path),
            Err(e) => tracing::error!("Failed to append usage log {:?}: {}", path, e),
        }
    }

    fn name(&self) -> &'static str {
        "FileLoggerHook"
    }
}
