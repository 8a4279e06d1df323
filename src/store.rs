use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::DateRange;
use crate::error::{DigestError, DigestResult};
use crate::models::Event;

/// Dump file name built from the literal date strings given on the command
/// line, e.g. `gitlab_events.2024-09-01_2024-09-30.json`.
pub fn dump_file_name(start: &str, end: &str) -> String {
    format!("gitlab_events.{}_{}.json", start, end)
}

pub fn dump_path(dir: &Path, range: &DateRange) -> PathBuf {
    dir.join(dump_file_name(&range.start_label, &range.end_label))
}

/// Writes the events as a two-space indented JSON array, replacing any
/// existing file.
pub async fn save_events(events: &[Event], path: &Path) -> DigestResult<()> {
    let data = serde_json::to_vec_pretty(events)?;

    tokio::fs::write(path, data)
        .await
        .map_err(|source| DigestError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Saved {} event(s) to {}", events.len(), path.display());
    Ok(())
}
