use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;

mod dispatcher;
mod handlers;
mod image_intake;
mod models;
mod prompt;
mod providers;

use crate::handlers::AppState;
use crate::models::{parse_candidate_list, AiConfig, AppConfig, ServerConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = load_config();

    info!(
        "Starting Rust Chart Advisor on {}:{}",
        config.server.host, config.server.port
    );
    info!(
        "Gemini candidates: {:?}, OpenAI candidates: {:?}",
        config.ai.gemini_candidates, config.ai.openai_candidates
    );

    let workers = config.server.workers.unwrap_or(4);
    let bind_addr = (config.server.host.clone(), config.server.port);

    let app_state = match AppState::new(config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to initialize application state: {e}");
            return Err(std::io::Error::other(e));
        }
    };

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin_fn(|_origin, _req_head| true)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec!["Accept", "Content-Type"])
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .service(
                web::scope("/api")
                    .route("/analyze", web::post().to(handlers::analyze))
                    .route("/models/probe", web::post().to(handlers::probe_models))
                    .route("/providers", web::get().to(handlers::get_providers))
                    .route("/health", web::get().to(handlers::health_check)),
            )
            .route("/", web::get().to(handlers::index))
    })
    .bind((bind_addr.0.as_str(), bind_addr.1))?
    .workers(workers)
    .run()
    .await
}

fn load_config() -> AppConfig {
    use std::fs;

    // Try to load from config file
    if let Ok(config_str) = fs::read_to_string("config.json") {
        if let Ok(config) = serde_json::from_str::<AppConfig>(&config_str) {
            return config;
        }
    }

    // Try to load from environment or use defaults
    let defaults = AiConfig::default();
    AppConfig {
        server: ServerConfig {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            workers: std::env::var("WORKERS").ok().and_then(|w| w.parse().ok()),
        },
        ai: AiConfig {
            timeout_seconds: std::env::var("AI_TIMEOUT")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            gemini_default_model: std::env::var("GEMINI_DEFAULT_MODEL")
                .unwrap_or(defaults.gemini_default_model),
            openai_default_model: std::env::var("OPENAI_DEFAULT_MODEL")
                .unwrap_or(defaults.openai_default_model),
            gemini_candidates: std::env::var("GEMINI_CANDIDATES")
                .map(|raw| parse_candidate_list(&raw))
                .unwrap_or(defaults.gemini_candidates),
            openai_candidates: std::env::var("OPENAI_CANDIDATES")
                .map(|raw| parse_candidate_list(&raw))
                .unwrap_or(defaults.openai_candidates),
        },
    }
}
