use crate::config::GeminiConfig;
use crate::provider::{GenerationError, GenerationResult, TextGenProvider};
use crate::types::{GenerationRequest, GenerationResponse, Usage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiApiRequest {
    contents: Vec<GeminiApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiApiGenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct GeminiApiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiApiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiApiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiApiResponse {
    #[serde(default)]
    candidates: Vec<GeminiApiCandidate>,
    usage_metadata: Option<GeminiApiUsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiApiCandidate {
    content: Option<GeminiApiContent>,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiApiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

pub struct GeminiProvider {
    http_client: reqwest::Client,
    base_url: String,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> GenerationResult<Self> {
        config
            .validate()
            .map_err(|msg| GenerationError::InvalidConfig { message: msg })?;

        let base_url = if config.base_url.ends_with('/') {
            config.base_url.trim_end_matches('/').to_string()
        } else {
            config.base_url.clone()
        };

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Unknown {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            base_url,
            config,
        })
    }

    pub fn from_env() -> GenerationResult<Self> {
        let config = GeminiConfig::from_env()
            .map_err(|msg| GenerationError::InvalidConfig { message: msg })?;
        Self::new(config)
    }

    fn generate_url(&self, model: &str) -> String {
        // Callers may pass either "gemini-x" or the "models/gemini-x" form.
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model
        )
    }

    fn build_request_body(&self, request: &GenerationRequest) -> GeminiApiRequest {
        let system_instruction = request.system.as_ref().map(|text| GeminiApiContent {
            role: None,
            parts: vec![GeminiApiPart { text: text.clone() }],
        });

        let temperature = request
            .temperature
            .or(self.config.default_temperature);
        let max_output_tokens = request
            .max_output_tokens
            .or(self.config.default_max_output_tokens);

        let generation_config = if temperature.is_some() || max_output_tokens.is_some() {
            Some(GeminiApiGenerationConfig {
                temperature,
                max_output_tokens,
            })
        } else {
            None
        };

        GeminiApiRequest {
            contents: vec![GeminiApiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiApiPart {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction,
            generation_config,
        }
    }

    fn parse_response(response: GeminiApiResponse) -> GenerationResult<GenerationResponse> {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        let usage = response.usage_metadata.map(|metadata| Usage {
            prompt_tokens: metadata.prompt_token_count.unwrap_or(0),
            completion_tokens: metadata.candidates_token_count.unwrap_or(0),
            total_tokens: metadata.total_token_count.unwrap_or(0),
        });

        Ok(GenerationResponse { text, usage })
    }

    fn map_transport_error(e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::ServiceUnavailable {
                message: "Request timeout".to_string(),
            }
        } else if e.is_connect() {
            GenerationError::ServiceUnavailable {
                message: "Cannot connect to the Gemini API".to_string(),
            }
        } else {
            GenerationError::Network(e)
        }
    }

    fn map_status_error(status: reqwest::StatusCode, body: String) -> GenerationError {
        match status.as_u16() {
            401 | 403 => GenerationError::Authentication,
            429 => GenerationError::RateLimit,
            _ => GenerationError::Unknown {
                message: format!("Gemini API returned {}: {}", status, body),
            },
        }
    }
}

#[async_trait]
impl TextGenProvider for GeminiProvider {
    async fn generate(&self, request: GenerationRequest) -> GenerationResult<GenerationResponse> {
        debug!("Starting generation request with model: {}", request.model);

        let body = self.build_request_body(&request);
        let url = self.generate_url(&request.model);

        let http_response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = http_response.status();
        if !status.is_success() {
            let error_text = http_response.text().await.unwrap_or_default();
            error!("Gemini API request failed with status {}", status);
            return Err(Self::map_status_error(status, error_text));
        }

        let api_response: GeminiApiResponse = http_response
            .json()
            .await
            .map_err(GenerationError::Network)?;

        let response = Self::parse_response(api_response)?;

        info!("Generation request completed successfully");

        Ok(response)
    }

    async fn health_check(&self) -> GenerationResult<()> {
        debug!("Performing health check");

        let url = format!("{}/v1beta/models", self.base_url);
        let http_response = self
            .http_client
            .get(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = http_response.status();
        if !status.is_success() {
            let error_text = http_response.text().await.unwrap_or_default();
            error!("Health check failed with status {}", status);
            return Err(Self::map_status_error(status, error_text));
        }

        info!("Health check passed");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}
