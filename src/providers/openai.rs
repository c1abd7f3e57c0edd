//! OpenAI chat-completions client (vision input + model listing).

use serde::{Deserialize, Serialize};

use super::ModelClient;
use crate::image_intake::ChartImage;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model id prefixes that accept image input.
const MULTIMODAL_PREFIXES: &[&str] = &["gpt-4o", "gpt-4.1", "gpt-4-turbo"];

pub struct OpenAiClient {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelListResponse {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

fn is_multimodal(id: &str) -> bool {
    MULTIMODAL_PREFIXES.iter().any(|p| id.starts_with(p))
}

#[async_trait::async_trait]
impl ModelClient for OpenAiClient {
    async fn list_models(&self) -> Result<Vec<String>, String> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "OpenAI HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        let data: ModelListResponse = response
            .json()
            .await
            .map_err(|e| format!("JSON parse failed: {}", e))?;

        let mut models: Vec<String> = data
            .data
            .into_iter()
            .map(|m| m.id)
            .filter(|id| is_multimodal(id))
            .collect();
        models.sort();

        Ok(models)
    }

    async fn generate(
        &self,
        model: &str,
        image: &ChartImage,
        prompt: &str,
    ) -> Result<String, String> {
        let url = format!("{}/chat/completions", self.base_url);

        let payload = ChatCompletionRequest {
            model: model.to_string(),
            max_tokens: 4000,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{};base64,{}", image.mime, image.to_base64()),
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "OpenAI HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| format!("JSON parse failed: {}", e))?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| "OpenAI 返回内容为空".to_string())
    }
}
