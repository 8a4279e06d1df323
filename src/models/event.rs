use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;

/// One contribution event, in the shape both the dump file and the
/// summarization prompt use. Field names follow the GitLab API so a raw
/// events export can be fed to file mode as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(rename = "action_name", default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(rename = "target_title", default, deserialize_with = "null_as_default")]
    pub target: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
