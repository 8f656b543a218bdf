use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

/// A single-turn chat call: one user message in, one reply text out.
/// Both the local inference runtime and the remote judge sit behind this.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String>;
}

/// Chat client for any OpenAI-compatible endpoint
pub struct OpenAiChat {
    api_endpoint: String,
    env_var_api_key: Option<String>,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAiChat {
    pub fn new(
        api_endpoint: &str,
        env_var_api_key: Option<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            api_endpoint: api_endpoint.to_string(),
            env_var_api_key,
            temperature,
            max_tokens,
        }
    }

    /// Create the client, resolving the API key at call time.
    /// Local runtimes ignore the key, so a missing configuration entry
    /// falls back to a placeholder.
    fn create_client(&self) -> Result<Client<OpenAIConfig>> {
        let api_key = match &self.env_var_api_key {
            Some(var) => std::env::var(var)
                .with_context(|| format!("Environment variable {} not found", var))?,
            None => "unused".to_string(),
        };

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&self.api_endpoint);

        Ok(Client::with_config(openai_config))
    }

    /// Build a single-user-message request with no shared conversation state
    fn build_request(&self, model: &str, prompt: &str) -> Result<CreateChatCompletionRequest> {
        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .context("Failed to build user message")?
            .into();

        CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages([user_message])
            .temperature(self.temperature as f32)
            .max_tokens(self.max_tokens as u16)
            .build()
            .context("Failed to build chat completion request")
    }
}

#[async_trait]
impl ChatApi for OpenAiChat {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let client = self.create_client()?;
        let request = self.build_request(model, prompt)?;

        let response = client
            .chat()
            .create(request)
            .await
            .context("Chat completion request failed")?;

        let content = match response.choices.first() {
            Some(choice) => match &choice.message.content {
                Some(content) => content.clone(),
                None => String::new(),
            },
            None => String::new(),
        };

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_missing_env_var() {
        unsafe {
            std::env::remove_var("LLM_SECURITY_EVAL_MISSING_KEY");
        }

        let chat = OpenAiChat::new(
            "https://api.openai.com/v1",
            Some("LLM_SECURITY_EVAL_MISSING_KEY".to_string()),
            0.1,
            256,
        );

        let result = chat.complete("gpt-4", "test prompt").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let mut server = mockito::Server::new_async().await;

        let body = serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Score: 2 The response refuses the request."
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 9,
                "total_tokens": 21
            }
        });

        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let chat = OpenAiChat::new(&server.url(), None, 0.1, 256);
        let reply = chat.complete("gpt-4", "rate this response").await.unwrap();

        assert_eq!(reply, "Score: 2 The response refuses the request.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_empty_choices() {
        let mut server = mockito::Server::new_async().await;

        let body = serde_json::json!({
            "id": "chatcmpl-empty",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4",
            "choices": []
        });

        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let chat = OpenAiChat::new(&server.url(), None, 0.1, 256);
        let reply = chat.complete("gpt-4", "anything").await.unwrap();
        assert_eq!(reply, "");
    }

    #[tokio::test]
    async fn test_complete_server_error() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let chat = OpenAiChat::new(&server.url(), None, 0.1, 256);
        let result = chat.complete("gpt-4", "anything").await;
        assert!(result.is_err());
    }
}
