use tracing::info;

use crate::config::Config;
use crate::error::DigestResult;
use crate::models::Event;
use crate::source::{EventSource, FileSource, GitLabSource};
use crate::store;
use crate::summarizer::Summarizer;
use crate::utils::llm::{LlmClient, OpenAiClient};

/// File mode when `--file` was given, GitLab otherwise.
pub fn event_source(config: &Config) -> Box<dyn EventSource + Send + Sync> {
    match &config.file {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(GitLabSource::new(&config.gitlab, config.range.clone())),
    }
}

/// Loads or fetches the events; fetched ones are also dumped into `output_dir`.
pub async fn collect_events(config: &Config) -> DigestResult<Vec<Event>> {
    let source = event_source(config);
    info!("Fetching user events data from {}", source.describe());

    let events = source.events().await?;

    if source.should_persist() {
        let path = store::dump_path(&config.output_dir, &config.range);
        store::save_events(&events, &path).await?;
    }

    Ok(events)
}

/// Runs the whole pipeline with the given LLM client and returns the summary.
pub async fn digest_with<T: LlmClient>(config: &Config, llm_client: T) -> DigestResult<String> {
    let events = collect_events(config).await?;
    Summarizer::new(llm_client, config.bullet_count)
        .summarize(&events)
        .await
}

pub async fn digest(config: &Config) -> DigestResult<String> {
    digest_with(config, OpenAiClient::new(&config.openai)).await
}

/// Text printed on success.
pub fn render(user: &str, summary: &str) -> String {
    format!("\nGitlab Events for user {}:\n{}", user, summary)
}
