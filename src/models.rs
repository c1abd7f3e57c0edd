use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    OpenAi,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

impl Provider {
    pub fn label(&self) -> &'static str {
        match self {
            Provider::Gemini => "Google Gemini",
            Provider::OpenAi => "OpenAI GPT-4o",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn error(error: String) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            message: None,
        }
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Model dispatch settings. Candidate lists are configuration rather than
/// compiled-in constants because upstream model naming changes frequently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub timeout_seconds: u64,
    pub gemini_default_model: String,
    pub openai_default_model: String,
    pub gemini_candidates: Vec<String>,
    pub openai_candidates: Vec<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            gemini_default_model: "models/gemini-1.5-flash".to_string(),
            openai_default_model: "gpt-4o".to_string(),
            gemini_candidates: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-flash-latest".to_string(),
                "gemini-1.5-pro".to_string(),
                "gemini-pro-vision".to_string(),
            ],
            openai_candidates: vec![
                "gpt-4o".to_string(),
                "gpt-4o-mini".to_string(),
                "gpt-4-turbo".to_string(),
            ],
        }
    }
}

impl AiConfig {
    pub fn default_model(&self, provider: Provider) -> &str {
        match provider {
            Provider::Gemini => &self.gemini_default_model,
            Provider::OpenAi => &self.openai_default_model,
        }
    }

    pub fn candidates(&self, provider: Provider) -> &[String] {
        match provider {
            Provider::Gemini => &self.gemini_candidates,
            Provider::OpenAi => &self.openai_candidates,
        }
    }
}

/// Parse a comma-separated candidate list from config or environment.
pub fn parse_candidate_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub provider: Provider,
    pub api_key: String,
    /// Explicit model choice; when absent the configured default is used,
    /// or the candidate list when `use_fallback` is set.
    pub model: Option<String>,
    #[serde(default)]
    pub use_fallback: bool,
    /// Uploaded chart image, base64 (a data URL prefix is accepted).
    pub image_base64: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub provider: Provider,
    /// The model that actually produced the commentary.
    pub model: String,
    pub analysis: String,
    pub attempted_models: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeRequest {
    pub provider: Provider,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResponse {
    pub provider: Provider,
    pub models: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub id: Provider,
    pub name: &'static str,
    pub default_model: String,
    pub candidates: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candidate_list() {
        let parsed = parse_candidate_list("gemini-1.5-flash, gemini-1.5-pro ,,gpt-4o");
        assert_eq!(parsed, vec!["gemini-1.5-flash", "gemini-1.5-pro", "gpt-4o"]);
        assert!(parse_candidate_list("  ,  ").is_empty());
    }

    #[test]
    fn test_provider_serde_roundtrip() {
        assert_eq!(
            serde_json::to_string(&Provider::OpenAi).unwrap(),
            "\"openai\""
        );
        let p: Provider = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(p, Provider::Gemini);
    }

    #[test]
    fn test_api_response_envelope() {
        let ok = ApiResponse::success(42);
        assert!(ok.success);
        assert_eq!(ok.data, Some(42));
        assert!(ok.error.is_none());

        let err = ApiResponse::<i32>::error("失败".to_string()).with_message("提示".to_string());
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("失败"));
        assert_eq!(err.message.as_deref(), Some("提示"));
    }

    #[test]
    fn test_analyze_request_defaults() {
        let req: AnalyzeRequest = serde_json::from_str(
            r#"{"provider":"gemini","api_key":"k","image_base64":"aGk="}"#,
        )
        .unwrap();
        assert!(!req.use_fallback);
        assert!(req.model.is_none());
    }
}
