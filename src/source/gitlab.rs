use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use super::EventSource;
use crate::config::{DateRange, GitLabSettings};
use crate::error::{DigestError, DigestResult};
use crate::models::Event;

pub const API_PREFIX: &str = "/api/v4";
pub const PER_PAGE: u32 = 100;

const SERVICE: &str = "GitLab";

/// A contribution event as the GitLab events API returns it. Only the fields
/// the digest uses are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct ContributionEvent {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub action_name: Option<String>,
    #[serde(default)]
    pub target_title: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<ContributionEvent> for Event {
    fn from(event: ContributionEvent) -> Self {
        Event {
            id: event.id.unwrap_or_default(),
            action: event.action_name.unwrap_or_default(),
            target: event.target_title.unwrap_or_default(),
            created_at: event.created_at,
        }
    }
}

/// Pagination state read from GitLab's `X-Page`, `X-Total-Pages` and
/// `X-Next-Page` headers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current: u32,
    pub total: Option<u32>,
    pub next: Option<u32>,
}

impl Pagination {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Pagination {
            current: header_number(headers, "x-page").unwrap_or(0),
            total: header_number(headers, "x-total-pages"),
            next: header_number(headers, "x-next-page"),
        }
    }

    /// The page to request next, or `None` once the current page has reached
    /// the total. Without a total (GitLab drops it above 10k results) the
    /// next-page header alone drives the walk.
    pub fn next_page(&self) -> Option<u32> {
        match self.total {
            Some(total) if self.current >= total => None,
            Some(_) => Some(self.next.unwrap_or(self.current + 1)),
            None => self.next.filter(|next| *next > self.current),
        }
    }
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

#[derive(Debug, Clone)]
pub struct GitLabClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitLabClient {
    pub fn new(settings: &GitLabSettings) -> Self {
        GitLabClient {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
        }
    }

    fn events_url(&self) -> String {
        format!("{}{}/events", self.base_url, API_PREFIX)
    }

    /// Fetches one page of the authenticated user's contribution events.
    pub async fn contribution_events_page(
        &self,
        after: NaiveDate,
        before: NaiveDate,
        page: u32,
    ) -> DigestResult<(Vec<ContributionEvent>, Pagination)> {
        let response = self
            .client
            .get(self.events_url())
            .bearer_auth(&self.token)
            .query(&[
                ("after", after.to_string()),
                ("before", before.to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await
            .map_err(DigestError::network(SERVICE))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("GitLab API error on page {}: {} {}", page, status, body);
            return Err(DigestError::from_status(SERVICE, status, body));
        }

        let pagination = Pagination::from_headers(response.headers());
        let events = response
            .json::<Vec<ContributionEvent>>()
            .await
            .map_err(DigestError::network(SERVICE))?;

        Ok((events, pagination))
    }

    /// Walks every page between `after` and `before`, concatenating pages in
    /// the order GitLab returns them.
    pub async fn contribution_events(
        &self,
        after: NaiveDate,
        before: NaiveDate,
    ) -> DigestResult<Vec<Event>> {
        let mut events = Vec::new();
        let mut page = 1;

        loop {
            let (batch, pagination) = self.contribution_events_page(after, before, page).await?;
            debug!(
                "Fetched page {} of {:?} with {} event(s)",
                pagination.current,
                pagination.total,
                batch.len()
            );

            events.extend(batch.into_iter().map(Event::from));

            match pagination.next_page() {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(events)
    }
}

/// Remote mode: the authenticated user's events within a date range.
pub struct GitLabSource {
    client: GitLabClient,
    range: DateRange,
}

impl GitLabSource {
    pub fn new(settings: &GitLabSettings, range: DateRange) -> Self {
        GitLabSource {
            client: GitLabClient::new(settings),
            range,
        }
    }
}

#[async_trait]
impl EventSource for GitLabSource {
    async fn events(&self) -> DigestResult<Vec<Event>> {
        info!(
            "Fetching contribution events from {} to {}",
            self.range.start, self.range.end
        );
        self.client
            .contribution_events(self.range.start, self.range.end)
            .await
    }

    fn should_persist(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("GitLab at {}", self.client.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(name, value) in pairs {
            map.insert(name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn reads_pagination_headers() {
        let pagination = Pagination::from_headers(&headers(&[
            ("x-page", "2"),
            ("x-total-pages", "5"),
            ("x-next-page", "3"),
        ]));

        assert_eq!(
            pagination,
            Pagination {
                current: 2,
                total: Some(5),
                next: Some(3)
            }
        );
        assert_eq!(pagination.next_page(), Some(3));
    }

    #[test]
    fn stops_when_current_reaches_total() {
        let last = Pagination::from_headers(&headers(&[
            ("x-page", "5"),
            ("x-total-pages", "5"),
            ("x-next-page", ""),
        ]));
        assert_eq!(last.next, None);
        assert_eq!(last.next_page(), None);

        let past_end = Pagination {
            current: 6,
            total: Some(5),
            next: Some(7),
        };
        assert_eq!(past_end.next_page(), None);
    }

    #[test]
    fn no_headers_means_single_page() {
        assert_eq!(Pagination::from_headers(&HeaderMap::new()).next_page(), None);
    }

    #[test]
    fn missing_total_follows_next_page() {
        let pagination = Pagination {
            current: 1,
            total: None,
            next: Some(2),
        };
        assert_eq!(pagination.next_page(), Some(2));

        let last = Pagination {
            current: 4,
            total: None,
            next: None,
        };
        assert_eq!(last.next_page(), None);
    }

    #[test]
    fn null_or_missing_fields_normalize_to_zero_values() {
        let raw: ContributionEvent =
            serde_json::from_str(r#"{"id": null, "target_title": "Stale cache"}"#).unwrap();

        let event = Event::from(raw);

        assert_eq!(event.id, 0);
        assert_eq!(event.action, "");
        assert_eq!(event.target, "Stale cache");
    }

    #[test]
    fn null_target_title_normalizes_to_empty() {
        let raw: ContributionEvent = serde_json::from_str(
            r#"{"id": 5, "project_id": 1, "action_name": "pushed to", "target_title": null,
                "created_at": "2024-09-03T12:00:00.000Z", "author_username": "jdoe"}"#,
        )
        .unwrap();

        let event = Event::from(raw);

        assert_eq!(event.id, 5);
        assert_eq!(event.action, "pushed to");
        assert_eq!(event.target, "");
        assert!(event.created_at.is_some());
    }
}
