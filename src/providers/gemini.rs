//! Google Gemini client (generateContent + model listing).

use serde::{Deserialize, Serialize};

use super::ModelClient;
use crate::image_intake::ChartImage;
use crate::prompt::GENERATE_CAPABILITY;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ListModelsResponse {
    models: Option<Vec<ListedModel>>,
}

#[derive(Deserialize)]
struct ListedModel {
    name: String,
    #[serde(rename = "supportedGenerationMethods", default)]
    supported_generation_methods: Vec<String>,
}

#[async_trait::async_trait]
impl ModelClient for GeminiClient {
    async fn list_models(&self) -> Result<Vec<String>, String> {
        let url = format!("{}/models?key={}", self.base_url, self.api_key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Gemini HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        let data: ListModelsResponse = response
            .json()
            .await
            .map_err(|e| format!("JSON parse failed: {}", e))?;

        let models = data
            .models
            .unwrap_or_default()
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == GENERATE_CAPABILITY)
            })
            .map(|m| m.name)
            .collect();

        Ok(models)
    }

    async fn generate(
        &self,
        model: &str,
        image: &ChartImage,
        prompt: &str,
    ) -> Result<String, String> {
        // The listing endpoint reports names as "models/<id>"; the generation
        // URL wants the bare id, so accept both spellings.
        let model_id = model.strip_prefix("models/").unwrap_or(model);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model_id, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime.to_string(),
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Gemini HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| format!("JSON parse failed: {}", e))?;

        data.candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| "Gemini 返回内容为空".to_string())
    }
}
