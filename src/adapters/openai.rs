use crate::config::toml_config::ModelConfig;
use crate::core::{EvaluationRequest, ModelClient};
use crate::utils::error::{EvalError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// OpenAI 相容端點的 chat-completions 客戶端
///
/// 不重試、不限流：每次呼叫送出一個請求，失敗直接回傳給呼叫端
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: ModelConfig,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: ModelConfig, api_key: String) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(std::time::Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            config,
            api_key,
        })
    }

    /// 優先使用設定中的金鑰，否則讀取設定指定的環境變數
    pub fn from_config(config: ModelConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) if !key.trim().is_empty() => key.clone(),
            _ => std::env::var(&config.api_key_env).map_err(|_| EvalError::MissingConfigError {
                field: config.api_key_env.clone(),
            })?,
        };
        Self::new(config, api_key)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String> {
        let prompt = request.render();
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system_instruction(),
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!("📡 POST {} (model: {})", self.endpoint(), self.config.model);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EvalError::ModelError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(EvalError::EmptyModelResponse)?;

        tracing::debug!("📡 Model reply: {}", content);
        Ok(content)
    }
}
