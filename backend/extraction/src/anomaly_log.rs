use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{ExtractionError, ExtractionResult};
use crate::route::AnomalyRecord;

const MAX_BYTES_BEFORE_ROTATE: u64 = 10 * 1024 * 1024;

/// Anomalies below the review threshold are never silently dropped: every
/// one gets a line in this rotating JSONL file.
#[derive(Clone)]
pub struct AnomalyLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl AnomalyLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Arc::new(Mutex::new(())) }
    }

    pub async fn append(&self, record: &AnomalyRecord) -> ExtractionResult<()> {
        let _guard = self.lock.lock().await;
        self.rotate_if_needed()?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ExtractionError::TextExtractionFailed(e.to_string()))?;
        let line = serde_json::to_string(record).map_err(|e| ExtractionError::TextExtractionFailed(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| ExtractionError::TextExtractionFailed(e.to_string()))?;
        Ok(())
    }

    fn rotate_if_needed(&self) -> ExtractionResult<()> {
        let Ok(meta) = std::fs::metadata(&self.path) else { return Ok(()) };
        if meta.len() < MAX_BYTES_BEFORE_ROTATE {
            return Ok(());
        }
        let rotated = rotated_path(&self.path);
        std::fs::rename(&self.path, rotated).map_err(|e| ExtractionError::TextExtractionFailed(e.to_string()))
    }
}

fn rotated_path(path: &Path) -> PathBuf {
    let suffix = chrono::Utc::now().format("%Y%m%dT%H%M%S");
    let mut rotated = path.to_path_buf();
    rotated.set_extension(format!("{suffix}.jsonl"));
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_writes_one_json_line() {
        let dir = std::env::temp_dir().join(format!("flx-anomaly-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("anomalies.jsonl");
        let log = AnomalyLog::new(&path);

        log.append(&AnomalyRecord {
            source_url: Some("https://example.gov/a".to_string()),
            parser_name: "generic",
            confidence_score: 0.1,
            reason: "below review threshold",
            logged_at: "2026-01-01T00:00:00Z".to_string(),
        })
        .await
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
