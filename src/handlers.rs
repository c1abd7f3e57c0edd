use actix_web::{web, HttpResponse, Result};
use chrono::Utc;

use crate::dispatcher;
use crate::image_intake;
use crate::models::*;
use crate::prompt::ANALYSIS_PROMPT;
use crate::providers::client_for;

pub struct AppState {
    pub config: AppConfig,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.ai.timeout_seconds))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self { config, http })
    }
}

pub async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

pub async fn health_check() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success("服务运行正常".to_string())))
}

pub async fn get_providers(state: web::Data<AppState>) -> Result<HttpResponse> {
    let ai = &state.config.ai;
    let providers: Vec<ProviderInfo> = [Provider::Gemini, Provider::OpenAi]
        .into_iter()
        .map(|id| ProviderInfo {
            id,
            name: id.label(),
            default_model: ai.default_model(id).to_string(),
            candidates: ai.candidates(id).to_vec(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(providers)))
}

/// Capability probe: list the models this credential can actually use.
pub async fn probe_models(
    data: web::Json<ProbeRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let request = data.into_inner();

    if request.api_key.trim().is_empty() {
        return Ok(HttpResponse::Ok()
            .json(ApiResponse::<ProbeResponse>::error("请先输入 API Key".to_string())));
    }

    let client = client_for(request.provider, request.api_key.trim(), &state.http);

    match dispatcher::probe_models(client.as_ref()).await {
        Ok(models) => Ok(HttpResponse::Ok().json(ApiResponse::success(ProbeResponse {
            provider: request.provider,
            models,
            timestamp: Utc::now(),
        }))),
        Err(error) => Ok(HttpResponse::Ok().json(
            ApiResponse::<ProbeResponse>::error(format!("连接失败。原因：{}", error))
                .with_message(
                    "提示：请检查 Key 是否有多余空格，或者去 aistudio.google.com 重新生成一个。"
                        .to_string(),
                ),
        )),
    }
}

/// Analyze one uploaded chart: decode, pick a dispatch path, return the report.
pub async fn analyze(
    data: web::Json<AnalyzeRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let request = data.into_inner();

    if request.api_key.trim().is_empty() {
        return Ok(HttpResponse::Ok()
            .json(ApiResponse::<AnalyzeResponse>::error("请先输入 API Key".to_string())));
    }

    let image = match image_intake::decode_upload(&request.image_base64) {
        Ok(image) => image,
        Err(error) => {
            return Ok(HttpResponse::Ok().json(ApiResponse::<AnalyzeResponse>::error(error)))
        }
    };

    log::info!(
        "Analyzing {}x{} {} upload via {}",
        image.width,
        image.height,
        image.mime,
        request.provider
    );

    let ai = &state.config.ai;
    let client = client_for(request.provider, request.api_key.trim(), &state.http);

    let outcome = match &request.model {
        Some(model) => {
            dispatcher::dispatch_single(client.as_ref(), model, &image, ANALYSIS_PROMPT).await
        }
        None if request.use_fallback => {
            dispatcher::dispatch_with_fallback(
                client.as_ref(),
                ai.candidates(request.provider),
                &image,
                ANALYSIS_PROMPT,
            )
            .await
        }
        None => {
            dispatcher::dispatch_single(
                client.as_ref(),
                ai.default_model(request.provider),
                &image,
                ANALYSIS_PROMPT,
            )
            .await
        }
    };

    match outcome {
        Ok(outcome) => Ok(HttpResponse::Ok().json(ApiResponse::success(AnalyzeResponse {
            provider: request.provider,
            model: outcome.model,
            analysis: outcome.analysis,
            attempted_models: outcome.attempted,
            timestamp: Utc::now(),
        }))),
        Err(error) => {
            Ok(HttpResponse::Ok().json(ApiResponse::<AnalyzeResponse>::error(error)))
        }
    }
}
