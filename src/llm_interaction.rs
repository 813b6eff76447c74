use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::chat::{ChatService, ChatTurn};
use crate::constants;
use crate::error::{FoodyError, Result};

// Structures matching the OpenAI-compatible /chat/completions endpoint
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    // usage, id, etc. are ignored
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChatTurn,
}

/// Client for an OpenAI-compatible chat completion API. No timeout: a call
/// blocks until the service answers or the connection fails.
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiChatClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            constants::CHAT_API_URL.as_str(),
            constants::CHAT_MODEL.as_str(),
            constants::OPENAI_API_KEY.as_str(),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for OpenAiChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl ChatService for OpenAiChatClient {
    #[instrument(skip_all, fields(turns = turns.len()))]
    async fn complete(&self, turns: &[ChatTurn]) -> Result<ChatTurn> {
        let url = self.endpoint();
        let request_payload = ChatCompletionRequest {
            model: &self.model,
            messages: turns,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_payload)
            .send()
            .await
            .map_err(|e| FoodyError::ChatService(format!("Failed to send request to {}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %error_body, "Chat API request failed");
            return Err(FoodyError::ChatService(format!(
                "Chat API request failed with status {}: {}",
                status, error_body
            )));
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| FoodyError::ChatService(format!("Failed to parse chat API response: {}", e)))?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| ChatTurn::assistant(choice.message.content))
            .ok_or_else(|| FoodyError::ChatService("Chat API returned no choices".to_string()))?;

        debug!(model = %self.model, reply = %reply.content, "Received chat reply");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
            ]
        })
    }

    #[tokio::test]
    async fn test_complete_sends_full_log_and_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    { "role": "user", "content": "Hôm nay ăn gì?" },
                    { "role": "assistant", "content": "Phở" },
                    { "role": "user", "content": "Còn gì khác?" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Bún bò")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new(format!("{}/v1/", server.uri()), "gpt-3.5-turbo", "sk-test");
        let turns = vec![
            ChatTurn::user("Hôm nay ăn gì?"),
            ChatTurn::assistant("Phở"),
            ChatTurn::user("Còn gì khác?"),
        ];

        let reply = client.complete(&turns).await.unwrap();
        assert_eq!(reply, ChatTurn::assistant("Bún bò"));
    }

    #[tokio::test]
    async fn test_error_status_is_chat_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new(server.uri(), "gpt-3.5-turbo", "bad");
        let err = client.complete(&[ChatTurn::user("Hello")]).await.unwrap_err();

        match err {
            FoodyError::ChatService(msg) => assert!(msg.contains("invalid api key")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new(server.uri(), "gpt-3.5-turbo", "sk-test");
        assert!(client.complete(&[ChatTurn::user("Hello")]).await.is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = OpenAiChatClient::new("http://localhost", "m", "sk-secret");
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("sk-secret"));
    }
}
