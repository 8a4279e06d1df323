use tracing::{info, warn};

use crate::error::{DigestError, DigestResult};
use crate::models::Event;
use crate::utils::llm::{Completion, LlmClient};

/// Turns a run's events into a handful of bullet points with one LLM call.
pub struct Summarizer<T: LlmClient> {
    llm_client: T,
    bullet_count: u32,
}

impl<T: LlmClient> Summarizer<T> {
    pub fn new(llm_client: T, bullet_count: u32) -> Self {
        Summarizer {
            llm_client,
            bullet_count,
        }
    }

    pub fn build_prompt(&self, events: &[Event]) -> DigestResult<String> {
        let event_data = serde_json::to_string(events)?;

        Ok(format!(
            "Summarize the following GitLab user's events in {count}\n\
             bullet points, mostly ten words or fewer, in a terse, abbreviated, human-sounding tone.\n\
             \n\
             Do not end lines with a period. Start every bullet point with a past-tense verb, e.g. 'Pushed\n\
             bug fixes for... Engaged in discussions about... etc'.\n\
             \n\
             Include how many Merge Requests, Epics and Issues were worked on, opened and closed,\n\
             any version numbers upgraded to, the nature of code changes and pipeline runs. Do\n\
             not mention branch or MR deletions.\n\
             \n\
             Add small inconsistencies in capitalization, punctuation or abbreviations so it\n\
             reads like a person wrote it, and vary the structure of each bullet point, some longer\n\
             ones with commas, some shorter ones without:\n\
             {events}",
            count = self.bullet_count,
            events = event_data
        ))
    }

    /// Sends one completion request. An error message inside the API response
    /// is returned as the summary text rather than as a failure.
    pub async fn summarize(&self, events: &[Event]) -> DigestResult<String> {
        info!("Summarizing {} event(s) into {} bullet point(s)", events.len(), self.bullet_count);

        let prompt = self.build_prompt(events)?;

        match self.llm_client.complete(&prompt).await? {
            Completion::Answer(text) => Ok(text),
            Completion::Refused(error) => {
                warn!("Summarization API reported an error: {}", error.message);
                Ok(error.message)
            }
            Completion::Empty(body) => Err(DigestError::EmptyResponse(body)),
        }
    }
}
