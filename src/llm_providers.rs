use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::plan_schema::strict_schema;

/// A single prompt plus the JSON shape the reply must follow
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system_message: Option<String>,
    pub prompt: String,
    pub schema_name: String,
    pub schema: Value,
    /// Ask the model to skip extended reasoning for lower latency
    pub disable_thinking: bool,
}

/// Anything that can turn a structured request into a raw text reply.
///
/// `Ok(None)` means the call completed but carried no text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, request: &StructuredRequest) -> Result<Option<String>>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Common message structure for LLM requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: String,
    pub content: String,
}

/// Enum-based LLM provider implementation
#[derive(Debug, Clone)]
pub enum LLMProvider {
    OpenAI(OpenAIProvider),
    Gemini(GeminiProvider),
}

#[async_trait]
impl TextGenerator for LLMProvider {
    async fn generate_text(&self, request: &StructuredRequest) -> Result<Option<String>> {
        match self {
            LLMProvider::OpenAI(provider) => provider.make_request(request).await,
            LLMProvider::Gemini(provider) => provider.make_request(request).await,
        }
    }

    fn provider_name(&self) -> &str {
        match self {
            LLMProvider::OpenAI(provider) => provider.provider_name(),
            LLMProvider::Gemini(provider) => provider.provider_name(),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            LLMProvider::OpenAI(provider) => provider.model_name(),
            LLMProvider::Gemini(provider) => provider.model_name(),
        }
    }
}

fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// OpenAI-compatible provider using `response_format: json_schema`
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<LLMMessage>,
    response_format: OpenAIResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: OpenAIJsonSchema,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIJsonSchema {
    name: String,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
        })
    }

    pub async fn make_request(&self, request: &StructuredRequest) -> Result<Option<String>> {
        let mut messages = Vec::new();

        if let Some(sys_msg) = &request.system_message {
            messages.push(LLMMessage {
                role: "system".to_string(),
                content: sys_msg.clone(),
            });
        }

        messages.push(LLMMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        // Reasoning hints are model specific here, so disable_thinking is not forwarded
        let request_body = OpenAIRequest {
            model: self.model.clone(),
            messages,
            response_format: OpenAIResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: OpenAIJsonSchema {
                    name: request.schema_name.clone(),
                    strict: true,
                    schema: strict_schema(&request.schema),
                },
            },
        };

        info!(
            provider = self.provider_name(),
            model = %self.model,
            base_url = %self.base_url,
            prompt_length = request.prompt.len(),
            "Making LLM request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                provider = self.provider_name(),
                status = %status,
                error = %error_text,
                "LLM API request failed"
            );
            return Err(anyhow::anyhow!("OpenAI API request failed with status {}: {}", status, error_text));
        }

        let openai_response = response
            .json::<OpenAIResponse>()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to decode OpenAI response envelope")?;

        let response_content = openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        info!(
            provider = self.provider_name(),
            response_length = response_content.as_ref().map(|c| c.len()).unwrap_or(0),
            "Received LLM response"
        );

        Ok(response_content)
    }

    pub fn provider_name(&self) -> &'static str {
        "OpenAI"
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

/// Gemini provider using `responseSchema` structured output
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
    #[serde(rename = "thinkingConfig", skip_serializing_if = "Option::is_none")]
    thinking_config: Option<GeminiThinkingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiThinkingConfig {
    #[serde(rename = "thinkingBudget")]
    thinking_budget: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            model: model.unwrap_or_else(|| "gemini-2.5-flash".to_string()),
        })
    }

    pub async fn make_request(&self, request: &StructuredRequest) -> Result<Option<String>> {
        let text_content = |text: &str| GeminiContent {
            parts: vec![GeminiPart {
                text: Some(text.to_string()),
            }],
        };

        let request_body = GeminiRequest {
            contents: vec![text_content(&request.prompt)],
            system_instruction: request.system_message.as_deref().map(text_content),
            generation_config: GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: request.schema.clone(),
                thinking_config: request
                    .disable_thinking
                    .then_some(GeminiThinkingConfig { thinking_budget: 0 }),
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        info!(
            provider = self.provider_name(),
            model = %self.model,
            base_url = %self.base_url,
            prompt_length = request.prompt.len(),
            "Making LLM request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                provider = self.provider_name(),
                status = %status,
                error = %error_text,
                "LLM API request failed"
            );
            return Err(anyhow::anyhow!("Gemini API request failed with status {}: {}", status, error_text));
        }

        let gemini_response = response
            .json::<GeminiResponse>()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to decode Gemini response envelope")?;

        let response_content = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty());

        info!(
            provider = self.provider_name(),
            response_length = response_content.as_ref().map(|c| c.len()).unwrap_or(0),
            "Received LLM response"
        );

        Ok(response_content)
    }

    pub fn provider_name(&self) -> &'static str {
        "Gemini"
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*```(?:json|JSON)?\s*\n?(.*?)\n?\s*```\s*\z").expect("code fence pattern is valid")
});

/// Parses model replies into typed values
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseParser;

impl JsonResponseParser {
    /// Strip one surrounding markdown code fence; anything else is returned trimmed
    pub fn strip_code_fence(content: &str) -> &str {
        match CODE_FENCE.captures(content).and_then(|captures| captures.get(1)) {
            Some(inner) => inner.as_str().trim(),
            None => content.trim(),
        }
    }

    /// Parse a JSON reply into a specific type
    pub fn parse_json_response<T>(&self, content: &str) -> serde_json::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let json_content = Self::strip_code_fence(content);
        debug!(json_length = json_content.len(), "Parsing JSON response");
        serde_json::from_str::<T>(json_content)
    }
}

/// Factory for creating LLM providers based on provider type
pub struct LLMProviderFactory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LLMProviderType {
    OpenAI,
    Gemini,
}

impl LLMProviderFactory {
    /// Create a new LLM provider instance based on provider type
    pub fn create_provider(
        provider_type: LLMProviderType,
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<LLMProvider> {
        let provider = match provider_type {
            LLMProviderType::OpenAI => {
                LLMProvider::OpenAI(OpenAIProvider::new(api_key, base_url, model, timeout)?)
            }
            LLMProviderType::Gemini => {
                LLMProvider::Gemini(GeminiProvider::new(api_key, base_url, model, timeout)?)
            }
        };
        Ok(provider)
    }

    pub fn from_config(config: &crate::config::LLMConfig) -> Result<LLMProvider> {
        Self::create_provider(
            config.provider,
            config.api_key.clone(),
            config.base_url.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}
