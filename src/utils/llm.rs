use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::OpenAiSettings;
use crate::error::{DigestError, DigestResult};
use crate::models::null_as_default;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const CHAT_MODEL: &str = "gpt-4o-2024-08-06";
pub const MAX_TOKENS: u32 = 150;
pub const TEMPERATURE: f32 = 0.7;

const SERVICE: &str = "OpenAI";

/// Outcome of a chat completion call, decided after the envelope is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Text of the first choice.
    Answer(String),
    /// The API reported an error inside the envelope.
    Refused(ApiErrorBody),
    /// Neither choices nor an error message; carries the raw body.
    Empty(String),
}

#[async_trait]
pub trait LlmClient {
    async fn complete(&self, prompt: &str) -> DigestResult<Completion>;
}

#[async_trait]
impl<T: LlmClient + Sync + ?Sized> LlmClient for &T {
    async fn complete(&self, prompt: &str) -> DigestResult<Completion> {
        (**self).complete(prompt).await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ChatResponse {
    fn into_completion(self, raw: String) -> Completion {
        if let Some(error) = self.error.filter(|e| !e.message.is_empty()) {
            return Completion::Refused(error);
        }

        match self.choices.into_iter().next() {
            Some(choice) => Completion::Answer(
                choice
                    .message
                    .and_then(|message| message.content)
                    .unwrap_or_default(),
            ),
            None => Completion::Empty(raw),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(settings: &OpenAiSettings) -> Self {
        OpenAiClient {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: CHAT_MODEL.to_string(),
        }
    }

    /// Ids of the models the key can use, in the order the API lists them.
    pub async fn list_models(&self) -> DigestResult<Vec<String>> {
        let url = format!("{}/v1/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(DigestError::network(SERVICE))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI API error: {} {}", status, body);
            return Err(DigestError::from_status(SERVICE, status, body));
        }

        let models = response
            .json::<ModelList>()
            .await
            .map_err(DigestError::network(SERVICE))?;

        Ok(models.data.into_iter().map(|m| m.id).collect())
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> DigestResult<Completion> {
        info!("Requesting completion from OpenAI using model: {}", self.model);

        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(DigestError::network(SERVICE))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(DigestError::network(SERVICE))?;

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            error!("OpenAI API rejected the key: {} {}", status, body);
            return Err(DigestError::from_status(SERVICE, status, body));
        }

        // Error envelopes on non-2xx statuses still carry a usable message.
        match serde_json::from_str::<ChatResponse>(&body) {
            Ok(parsed) => {
                if !status.is_success() {
                    error!("OpenAI API error: {} {}", status, body);
                }
                Ok(parsed.into_completion(body))
            }
            Err(_) if !status.is_success() => Err(DigestError::from_status(SERVICE, status, body)),
            Err(e) => Err(DigestError::UnexpectedStatus {
                service: SERVICE,
                status,
                body: format!("undecodable response ({}): {}", e, body),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(json: &str) -> Completion {
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        parsed.into_completion(json.to_string())
    }

    #[test]
    fn first_choice_wins() {
        let result = completion(
            r#"{"choices": [
                {"message": {"role": "assistant", "content": "- Merged 4 MRs"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]}"#,
        );
        assert_eq!(result, Completion::Answer("- Merged 4 MRs".to_string()));
    }

    #[test]
    fn error_message_takes_precedence() {
        let result = completion(
            r#"{"error": {"message": "Rate limit reached", "type": "requests", "code": null}}"#,
        );
        assert_eq!(
            result,
            Completion::Refused(ApiErrorBody {
                message: "Rate limit reached".to_string(),
                kind: Some("requests".to_string()),
            })
        );
    }

    #[test]
    fn empty_error_and_no_choices_is_empty() {
        let raw = r#"{"choices": [], "error": {"message": ""}}"#;
        assert_eq!(completion(raw), Completion::Empty(raw.to_string()));
        assert_eq!(completion("{}"), Completion::Empty("{}".to_string()));
    }

    #[test]
    fn null_content_is_empty_text() {
        let result = completion(r#"{"choices": [{"message": {"content": null}}]}"#);
        assert_eq!(result, Completion::Answer(String::new()));
    }

    #[test]
    fn null_error_message_falls_through_to_choices() {
        let result = completion(
            r#"{"error": {"message": null}, "choices": [{"message": {"content": "- Closed 2 issues"}}]}"#,
        );
        assert_eq!(result, Completion::Answer("- Closed 2 issues".to_string()));

        let raw = r#"{"error": {"message": null, "type": "server_error"}}"#;
        assert_eq!(completion(raw), Completion::Empty(raw.to_string()));
    }

    #[test]
    fn choice_without_message_is_empty_text() {
        let result = completion(r#"{"choices": [{"index": 0, "finish_reason": "length"}]}"#);
        assert_eq!(result, Completion::Answer(String::new()));
    }

    #[test]
    fn request_body_has_fixed_parameters() {
        let request = ChatRequest {
            model: CHAT_MODEL,
            messages: vec![ChatMessage {
                role: "system",
                content: "hello",
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o-2024-08-06");
        assert_eq!(value["max_tokens"], 150);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "hello");
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }
}
