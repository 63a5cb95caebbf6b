use crate::types::{GenerationRequest, GenerationResponse};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Response contained no generated text")]
    EmptyResponse,

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Authentication failed")]
    Authentication,

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

pub type GenerationResult<T> = Result<T, GenerationError>;

#[async_trait]
pub trait TextGenProvider: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> GenerationResult<GenerationResponse>;

    async fn health_check(&self) -> GenerationResult<()>;

    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Usage;

    struct MockProvider;

    #[async_trait]
    impl TextGenProvider for MockProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> GenerationResult<GenerationResponse> {
            Ok(GenerationResponse {
                text: "assert True".to_string(),
                usage: Some(Usage {
                    prompt_tokens: 5,
                    completion_tokens: 3,
                    total_tokens: 8,
                }),
            })
        }

        async fn health_check(&self) -> GenerationResult<()> {
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockProvider;

        let request = GenerationRequest::new("mock-model", "write a test");
        let response = provider.generate(request).await.unwrap();
        assert_eq!(response.text, "assert True");
        assert_eq!(response.usage.unwrap().total_tokens, 8);

        provider.health_check().await.unwrap();
        assert_eq!(provider.provider_name(), "mock");
    }
}
