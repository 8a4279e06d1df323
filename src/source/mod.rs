use async_trait::async_trait;

use crate::error::DigestResult;
use crate::models::Event;

mod file;
mod gitlab;

pub use file::FileSource;
pub use gitlab::{ContributionEvent, GitLabClient, GitLabSource, Pagination, API_PREFIX, PER_PAGE};

/// Where a run's events come from. Implementations return events in the
/// order they were received.
#[async_trait]
pub trait EventSource {
    async fn events(&self) -> DigestResult<Vec<Event>>;

    /// Whether the events should be dumped to disk after loading.
    fn should_persist(&self) -> bool;

    fn describe(&self) -> String;
}
