//! Request dispatch: capability probe, single-shot call, and the sequential
//! fallback over an ordered candidate model list.

use log::{info, warn};

use crate::image_intake::ChartImage;
use crate::providers::ModelClient;

/// Result of a successful dispatch: which model answered, what it said,
/// and which candidates were attempted along the way.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub model: String,
    pub analysis: String,
    pub attempted: Vec<String>,
}

/// Capability probe: which models can this credential use for generation?
pub async fn probe_models(client: &dyn ModelClient) -> Result<Vec<String>, String> {
    let models = client.list_models().await?;
    if models.is_empty() {
        return Err(
            "连接成功，但没有发现可用模型。这通常是因为 Key 所在的区域受限。".to_string(),
        );
    }
    info!("Capability probe found {} usable models", models.len());
    Ok(models)
}

/// Exactly one generation call against an explicitly chosen model.
pub async fn dispatch_single(
    client: &dyn ModelClient,
    model: &str,
    image: &ChartImage,
    prompt: &str,
) -> Result<DispatchOutcome, String> {
    info!("Dispatching analysis to model {}", model);
    match client.generate(model, image, prompt).await {
        Ok(analysis) => Ok(DispatchOutcome {
            model: model.to_string(),
            analysis,
            attempted: vec![model.to_string()],
        }),
        Err(e) => Err(format!("分析出错: {}", e)),
    }
}

/// Try each candidate in list order, stopping at the first success.
///
/// Attempts are strictly sequential so a slow first candidate never causes
/// duplicate billing. On total failure the error reports the LAST attempt,
/// which is the most recent view of what the provider rejected.
pub async fn dispatch_with_fallback(
    client: &dyn ModelClient,
    candidates: &[String],
    image: &ChartImage,
    prompt: &str,
) -> Result<DispatchOutcome, String> {
    if candidates.is_empty() {
        return Err("候选模型列表为空，请检查配置".to_string());
    }

    let mut attempted = Vec::with_capacity(candidates.len());
    let mut last_error = String::new();

    for model in candidates {
        attempted.push(model.clone());
        info!("Trying candidate model {}", model);
        match client.generate(model, image, prompt).await {
            Ok(analysis) => {
                return Ok(DispatchOutcome {
                    model: model.clone(),
                    analysis,
                    attempted,
                });
            }
            Err(e) => {
                warn!("Candidate model {} failed: {}", model, e);
                last_error = e;
            }
        }
    }

    Err(format!(
        "所有候选模型均失败（共尝试 {} 个）。最后一次错误: {}",
        attempted.len(),
        last_error
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ANALYSIS_PROMPT;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted provider: fixed outcome per model name, records every call.
    struct MockClient {
        outcomes: HashMap<String, Result<String, String>>,
        calls: Mutex<Vec<(String, String)>>,
        listed: Result<Vec<String>, String>,
    }

    impl MockClient {
        fn new(outcomes: &[(&str, Result<&str, &str>)]) -> Self {
            Self {
                outcomes: outcomes
                    .iter()
                    .map(|&(m, r)| {
                        (
                            m.to_string(),
                            r.map(str::to_string).map_err(str::to_string),
                        )
                    })
                    .collect(),
                calls: Mutex::new(Vec::new()),
                listed: Ok(Vec::new()),
            }
        }

        fn attempted_models(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(m, _)| m.clone())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl ModelClient for MockClient {
        async fn list_models(&self) -> Result<Vec<String>, String> {
            self.listed.clone()
        }

        async fn generate(
            &self,
            model: &str,
            _image: &ChartImage,
            prompt: &str,
        ) -> Result<String, String> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), prompt.to_string()));
            self.outcomes
                .get(model)
                .cloned()
                .unwrap_or_else(|| Err(format!("unknown model: {}", model)))
        }
    }

    fn chart() -> ChartImage {
        ChartImage {
            data: vec![1, 2, 3],
            mime: "image/png",
            width: 1,
            height: 1,
        }
    }

    fn candidates(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_success() {
        let client = MockClient::new(&[
            ("a", Err("a down")),
            ("b", Ok("来自 b 的报告")),
            ("c", Ok("never reached")),
        ]);

        let outcome =
            dispatch_with_fallback(&client, &candidates(&["a", "b", "c"]), &chart(), "p")
                .await
                .unwrap();

        assert_eq!(outcome.model, "b");
        assert_eq!(outcome.analysis, "来自 b 的报告");
        assert_eq!(outcome.attempted, vec!["a", "b"]);
        // c must never have been billed
        assert_eq!(client.attempted_models(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_fallback_reports_last_error_when_all_fail() {
        let client = MockClient::new(&[
            ("a", Err("first failure")),
            ("b", Err("middle failure")),
            ("c", Err("final failure")),
        ]);

        let err = dispatch_with_fallback(&client, &candidates(&["a", "b", "c"]), &chart(), "p")
            .await
            .unwrap_err();

        assert!(err.contains("final failure"), "got: {}", err);
        assert!(!err.contains("first failure"), "got: {}", err);
        assert_eq!(client.attempted_models(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fallback_first_candidate_wins() {
        let client = MockClient::new(&[("a", Ok("ok")), ("b", Ok("ok"))]);
        let outcome = dispatch_with_fallback(&client, &candidates(&["a", "b"]), &chart(), "p")
            .await
            .unwrap();
        assert_eq!(outcome.model, "a");
        assert_eq!(client.attempted_models(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_fallback_empty_candidate_list() {
        let client = MockClient::new(&[]);
        let err = dispatch_with_fallback(&client, &[], &chart(), "p")
            .await
            .unwrap_err();
        assert!(err.contains("候选模型列表为空"));
        assert!(client.attempted_models().is_empty());
    }

    #[tokio::test]
    async fn test_single_dispatch_embeds_raw_error() {
        let client = MockClient::new(&[("m", Err("HTTP 403: API key invalid"))]);
        let err = dispatch_single(&client, "m", &chart(), "p")
            .await
            .unwrap_err();
        assert!(err.contains("HTTP 403: API key invalid"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_prompt_is_forwarded_verbatim() {
        let client = MockClient::new(&[("m", Ok("ok"))]);
        dispatch_single(&client, "m", &chart(), ANALYSIS_PROMPT)
            .await
            .unwrap();
        let calls = client.calls.lock().unwrap();
        assert_eq!(calls[0].1, ANALYSIS_PROMPT);
    }

    #[tokio::test]
    async fn test_probe_rejects_empty_model_list() {
        let client = MockClient::new(&[]);
        let err = probe_models(&client).await.unwrap_err();
        assert!(err.contains("区域受限"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_probe_passes_provider_error_through() {
        let mut client = MockClient::new(&[]);
        client.listed = Err("HTTP 400: API_KEY_INVALID".to_string());
        let err = probe_models(&client).await.unwrap_err();
        assert!(err.contains("API_KEY_INVALID"));
    }

    #[tokio::test]
    async fn test_probe_keeps_provider_order() {
        let mut client = MockClient::new(&[]);
        client.listed = Ok(candidates(&["models/gemini-1.5-pro", "models/gemini-1.5-flash"]));
        let models = probe_models(&client).await.unwrap();
        assert_eq!(
            models,
            vec!["models/gemini-1.5-pro", "models/gemini-1.5-flash"]
        );
    }
}
