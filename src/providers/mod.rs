//! Provider clients for hosted multimodal models.

use crate::image_intake::ChartImage;
use crate::models::Provider;

pub mod gemini;
pub mod openai;

/// One hosted multimodal model endpoint, bound to a user-supplied credential.
///
/// Both operations convert every failure into a user-facing string carrying
/// the raw provider error; callers only decide whether and what to try next.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// Model identifiers this credential can use for image+text generation.
    async fn list_models(&self) -> Result<Vec<String>, String>;

    /// One multimodal generation call; returns the raw response text.
    async fn generate(
        &self,
        model: &str,
        image: &ChartImage,
        prompt: &str,
    ) -> Result<String, String>;
}

pub fn client_for(
    provider: Provider,
    api_key: &str,
    http: &reqwest::Client,
) -> Box<dyn ModelClient> {
    match provider {
        Provider::Gemini => Box::new(gemini::GeminiClient::new(api_key, http.clone())),
        Provider::OpenAi => Box::new(openai::OpenAiClient::new(api_key, http.clone())),
    }
}
