// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub mod api;
pub mod config;
pub mod llm;
pub mod pool;
pub mod validation;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use config::{LoggingConfig, ServerConfig};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::{evaluate_batch, evaluate_single, health_check, metrics_info, root, AppState};

/// Log filter used when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "ragas_server=info,ragas_evals=info,tower_http=info";

/// Initialize tracing (JSON lines or human-readable)
pub fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// CORS policy for the configured origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            // A wildcard cannot be combined with credentials
            Ok(_) if origin == "*" => {
                tracing::warn!("Ignoring wildcard CORS origin, credentials are allowed");
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

/// Build the HTTP router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    let body_limit = DefaultBodyLimit::max(state.config.server.max_body_bytes);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_info))
        .route("/evaluate", post(evaluate_single))
        .route("/evaluate/batch", post(evaluate_batch))
        .with_state(state)
        .layer(body_limit)
        .layer(cors)
        // Add tracing
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    // Initialize tracing
    init_tracing(&config.logging);

    tracing::info!("Starting RAGAS Evaluation Service");

    config.validate()?;
    let addr = config.socket_addr()?;

    tracing::info!(
        provider = %config.llm.effective_provider().as_str(),
        model = %config.llm.effective_model(),
        workers = config.evaluation.workers,
        timeout_secs = config.evaluation.timeout_secs,
        max_batch_size = config.evaluation.max_batch_size,
        "Configuration loaded"
    );
    if config.llm.falls_back_to_ollama() {
        tracing::warn!(
            "RAGAS_LLM_PROVIDER=openai but OPENAI_API_KEY is not set, evaluations will use Ollama"
        );
    }

    let app = build_router(AppState::new(config));

    tracing::info!("HTTP API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
