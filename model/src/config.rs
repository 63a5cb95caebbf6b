use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub base_url: String,
    #[serde(skip_serializing, default)]
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub default_temperature: Option<f32>,
    pub default_max_output_tokens: Option<u32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: "gemini-1.5-flash-latest".to_string(),
            // Generous: the pipeline applies its own per-call deadline on top.
            timeout: Duration::from_secs(300),
            default_temperature: None,
            default_max_output_tokens: None,
        }
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Reads the API key from the `GEMINI_API_KEY` environment variable.
    /// A missing or empty key is a configuration error, reported before
    /// any batch work starts.
    pub fn from_env() -> Result<Self, String> {
        match std::env::var(GEMINI_API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(format!(
                "{} environment variable is not set",
                GEMINI_API_KEY_VAR
            )),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.default_max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Base URL cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("Base URL must start with http:// or https://".to_string());
        }

        if self.api_key.trim().is_empty() {
            return Err("API key cannot be empty".to_string());
        }

        if self.model.is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        if let Some(temperature) = self.default_temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(max_output_tokens) = self.default_max_output_tokens {
            if max_output_tokens == 0 {
                return Err("Max output tokens must be greater than 0".to_string());
            }
        }

        if self.timeout.is_zero() {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::new("test-key");
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.model, "gemini-1.5-flash-latest");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = GeminiConfig::new("test-key")
            .with_base_url("https://api.example.com")
            .with_model("gemini-1.5-pro")
            .with_temperature(0.5)
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.default_temperature, Some(0.5));
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GeminiConfig::new("test-key");

        config.base_url = "".to_string();
        assert!(config.validate().is_err());

        config.base_url = "invalid-url".to_string();
        assert!(config.validate().is_err());

        config.base_url = "https://generativelanguage.googleapis.com".to_string();
        config.api_key = "".to_string();
        assert!(config.validate().is_err());

        config.api_key = "test-key".to_string();
        config.model = "".to_string();
        assert!(config.validate().is_err());

        config.model = "gemini-1.5-flash-latest".to_string();
        config.default_temperature = Some(3.0);
        assert!(config.validate().is_err());

        config.default_temperature = Some(0.7);
        config.timeout = Duration::from_secs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_missing_key() {
        std::env::remove_var(GEMINI_API_KEY_VAR);
        let result = GeminiConfig::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains(GEMINI_API_KEY_VAR));
    }

    #[test]
    #[serial]
    fn test_from_env_with_key() {
        std::env::set_var(GEMINI_API_KEY_VAR, "env-key");
        let config = GeminiConfig::from_env().unwrap();
        assert_eq!(config.api_key, "env-key");
        assert!(config.validate().is_ok());
        std::env::remove_var(GEMINI_API_KEY_VAR);
    }
}
