use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::EventSource;
use crate::error::{DigestError, DigestResult};
use crate::models::Event;

/// Events previously dumped by a remote run, or any JSON array of events.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

#[async_trait]
impl EventSource for FileSource {
    async fn events(&self) -> DigestResult<Vec<Event>> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| DigestError::Read {
                path: self.path.clone(),
                source,
            })?;

        let events: Vec<Event> =
            serde_json::from_str(&data).map_err(|source| DigestError::Parse {
                path: self.path.clone(),
                source,
            })?;

        debug!("Loaded {} event(s) from {}", events.len(), self.path.display());
        Ok(events)
    }

    fn should_persist(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        format!("file '{}'", self.path.display())
    }
}
