// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use axum::{extract::State, Json};
use ragas_evals::{MetricInfo, MetricKind, DEFAULT_METRICS, ENGINE_VERSION};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::api::AppState;

/// Health check response structure
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub llm_provider: String,
    pub llm_model: String,
    pub available_metrics: Vec<&'static str>,
}

/// Service metadata returned by the root endpoint
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub ragas_version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct MetricsCatalog {
    pub available_metrics: BTreeMap<&'static str, MetricInfo>,
    pub default_metrics: Vec<&'static str>,
}

/// GET /health - Static liveness, no judge probe
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("Health check requested");

    let llm = &state.config.llm;
    Json(HealthResponse {
        status: "healthy".to_string(),
        llm_provider: llm.effective_provider().as_str().to_string(),
        llm_model: llm.effective_model().to_string(),
        available_metrics: MetricKind::ALL.iter().map(|k| k.as_str()).collect(),
    })
}

/// GET / - Service info
pub async fn root() -> Json<ServiceInfo> {
    let endpoints = BTreeMap::from([
        ("health", "GET /health"),
        ("evaluate_single", "POST /evaluate"),
        ("evaluate_batch", "POST /evaluate/batch"),
        ("metrics_info", "GET /metrics"),
    ]);

    Json(ServiceInfo {
        service: "RAGAS Evaluation Microservice",
        version: env!("CARGO_PKG_VERSION"),
        ragas_version: ENGINE_VERSION,
        endpoints,
    })
}

/// GET /metrics - Metric catalog
pub async fn metrics_info() -> Json<MetricsCatalog> {
    Json(MetricsCatalog {
        available_metrics: MetricKind::ALL
            .iter()
            .map(|k| (k.as_str(), k.info()))
            .collect(),
        default_metrics: DEFAULT_METRICS.iter().map(|k| k.as_str()).collect(),
    })
}
