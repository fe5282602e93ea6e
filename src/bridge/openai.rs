use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{status_error, BridgeError, TextGenerator, GENERATION_SETTINGS};
use crate::config::Provider;

pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl OpenAiGenerator {
    pub fn new(client: Client, base_url: &str, model: &str, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, BridgeError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: GENERATION_SETTINGS.temperature,
            max_tokens: GENERATION_SETTINGS.max_output_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error("OpenAI", response).await);
        }

        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| BridgeError::MalformedResponse(e.to_string()))?;
        parsed.first_content()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    /// `choices[0].message.content`. A completion without choices is an error;
    /// a choice with a null content (refusals, tool calls) is an empty string.
    pub(crate) fn first_content(self) -> Result<String, BridgeError> {
        let choice = self
            .choices
            .and_then(|choices| choices.into_iter().next())
            .ok_or_else(|| {
                BridgeError::MalformedResponse("response contained no choices".to_string())
            })?;

        Ok(choice
            .message
            .and_then(|message| message.content)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(raw: &str) -> Result<String, BridgeError> {
        serde_json::from_str::<ChatCompletionResponse>(raw)
            .unwrap()
            .first_content()
    }

    #[test]
    fn extracts_first_choice_content() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hi there"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "other"}}
            ]
        }"#;
        assert_eq!(extract(raw).unwrap(), "Hi there");
    }

    #[test]
    fn null_content_is_empty_string() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(extract(raw).unwrap(), "");
    }

    #[test]
    fn missing_choices_is_malformed() {
        assert!(matches!(
            extract(r#"{"choices":[]}"#),
            Err(BridgeError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract(r#"{}"#),
            Err(BridgeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn request_carries_single_user_message() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "Hello",
            }],
            temperature: 0.5,
            max_tokens: 1024,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Hello");
        assert_eq!(value["max_tokens"], 1024);
    }
}
