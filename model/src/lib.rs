pub mod config;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod provider;
pub mod types;

pub use config::{GeminiConfig, GEMINI_API_KEY_VAR};
pub use provider::{GenerationError, GenerationResult, TextGenProvider};
pub use types::{GenerationRequest, GenerationResponse, Usage};

#[cfg(feature = "gemini")]
pub use gemini::GeminiProvider;

pub mod prelude {
    pub use crate::config::*;
    pub use crate::provider::*;
    pub use crate::types::*;

    #[cfg(feature = "gemini")]
    pub use crate::gemini::*;
}
