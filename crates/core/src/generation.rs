use crate::error::ProviderError;
use crate::traits::GenerationProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are an assistant that answers questions using only the \
document excerpts supplied by the user. If the excerpts do not contain the answer, say that \
the documents do not cover it instead of guessing.";

#[derive(Debug, Clone)]
pub struct GenerationClientConfig {
    /// Base URL of an OpenAI-compatible chat API, e.g. `https://api.deepseek.com`.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Chat-completions client used to synthesize answers from retrieved chunks.
pub struct HttpGenerationClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl HttpGenerationClient {
    pub fn new(config: GenerationClientConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url,
            model: config.model,
            api_key: config.api_key,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn build_prompt(question: &str, context: &[String]) -> String {
    let context_block = context.join("\n\n---\n\n");
    format!(
        "Answer the question using only the context below. If the context does not contain \
enough information, say so plainly.\n\nContext:\n{context_block}\n\nQuestion: {question}\n\nAnswer:"
    )
}

#[async_trait]
impl GenerationProvider for HttpGenerationClient {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String, ProviderError> {
        let prompt = build_prompt(question, context);
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.7,
            max_tokens: 1500,
        };

        let mut request = self.client.post(self.endpoint()).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                details: details.chars().take(200).collect(),
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|error| ProviderError::Malformed(error.to_string()))?;

        let answer = payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Malformed("response contained no choices".to_string()))?;

        Ok(answer.trim().to_string())
    }
}
