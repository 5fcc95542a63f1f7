//! OpenAI-compatible chat completions client

use crate::collab::CompletionModel;
use crate::config::ModelConfig;
use crate::{ConfigError, RippleError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// [`CompletionModel`] calling `POST {endpoint}/chat/completions`
#[derive(Debug, Clone)]
pub struct ChatCompletionsModel {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl ChatCompletionsModel {
    /// Builds a client from config, reading the API key from the environment
    ///
    /// A missing key is only an error for non-local endpoints; local
    /// gateways usually run without one.
    pub fn from_config(config: &ModelConfig) -> Result<Self, RippleError> {
        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        let is_local = config.endpoint.contains("localhost") || config.endpoint.contains("127.0.0.1");
        if api_key.is_none() && !is_local {
            return Err(ConfigError::MissingEnv(config.api_key_env.clone()).into());
        }
        Self::new(config, api_key)
    }

    pub fn new(config: &ModelConfig, api_key: Option<String>) -> Result<Self, RippleError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
        })
    }
}

#[async_trait]
impl CompletionModel for ChatCompletionsModel {
    async fn complete(&self, prompt: &str) -> Result<String, RippleError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RippleError::Timeout {
                    url: self.url.clone(),
                }
            } else {
                RippleError::Http {
                    url: self.url.clone(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RippleError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| RippleError::Model("completion had no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: &str) -> ModelConfig {
        ModelConfig {
            endpoint: endpoint.to_string(),
            model: "local/test".to_string(),
            ..ModelConfig::default()
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({ "model": "local/test" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": " Pro is $20.\nSUFFICIENT: YES " } }
                ]
            })))
            .mount(&server)
            .await;

        let model =
            ChatCompletionsModel::new(&config(&format!("{}/v1/", server.uri())), Some("secret".to_string()))
                .unwrap();
        let reply = model.complete("How much is Pro?").await.unwrap();
        assert_eq!(reply, "Pro is $20.\nSUFFICIENT: YES");
    }

    #[tokio::test]
    async fn test_empty_choices_is_model_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let model = ChatCompletionsModel::new(&config(&server.uri()), None).unwrap();
        assert!(matches!(
            model.complete("q").await,
            Err(RippleError::Model(_))
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let model = ChatCompletionsModel::new(&config(&server.uri()), None).unwrap();
        assert!(matches!(
            model.complete("q").await,
            Err(RippleError::HttpStatus { status: 429, .. })
        ));
    }

    #[test]
    fn test_missing_key_for_remote_endpoint() {
        let mut cfg = config("https://api.example.com/v1");
        cfg.api_key_env = "RIPPLE_QA_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert!(matches!(
            ChatCompletionsModel::from_config(&cfg),
            Err(RippleError::Config(ConfigError::MissingEnv(_)))
        ));
    }
}
