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

//! Evaluation API endpoints
//!
//! Both handlers hand the samples to the evaluation pool and wait for the
//! result; the request task itself never runs judge calls.

use super::{ApiError, ApiJson, AppState};
use crate::validation::validate_batch_size;
use axum::{extract::State, Json};
use ragas_evals::evaluation::ScoreRecord;
use ragas_evals::scores::mean_of_valid;
use ragas_evals::{
    run_evaluation, EvalError, EvaluateOptions, EvaluationOutput, EvaluationSample, ScoreMap,
    DEFAULT_METRICS,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

fn default_metrics() -> Vec<String> {
    DEFAULT_METRICS.iter().map(|k| k.to_string()).collect()
}

/// Request to evaluate one RAG response
#[derive(Debug, Deserialize)]
pub struct SingleEvaluationRequest {
    pub question: String,
    pub answer: String,
    pub contexts: Vec<String>,
    #[serde(default)]
    pub ground_truth: Option<String>,
    /// Metric identifiers; omitted or null selects the defaults
    #[serde(default)]
    pub metrics: Option<Vec<String>>,
}

/// Request to evaluate several RAG responses
#[derive(Debug, Deserialize)]
pub struct BatchEvaluationRequest {
    pub samples: Vec<EvaluationSample>,
    #[serde(default)]
    pub metrics: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    /// Requested metrics that were evaluated; null when indeterminate
    pub metrics: ScoreMap,
    pub overall_score: Option<f64>,
    pub evaluation_time_ms: u64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct BatchEvaluationResponse {
    pub results: Vec<ScoreRecord>,
    /// Per-metric means plus `overall`
    pub aggregate: ScoreMap,
    pub total_samples: usize,
    pub evaluation_time_ms: u64,
    pub timestamp: String,
}

fn timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

/// Run an evaluation on the pool
async fn invoke(
    state: &AppState,
    samples: Vec<EvaluationSample>,
    metric_names: Vec<String>,
) -> Result<EvaluationOutput, EvalError> {
    let llm_factory = state.llm_factory.clone();
    let options = EvaluateOptions {
        raise_exceptions: state.config.evaluation.raise_exceptions,
        max_concurrency: state.config.evaluation.max_concurrency,
    };
    let span = info_span!("evaluation", id = %Uuid::new_v4());

    state
        .pool
        .run(
            async move {
                let llm = llm_factory();
                run_evaluation(&samples, &metric_names, llm, &options).await
            }
            .instrument(span),
        )
        .await
}

/// POST /evaluate - Evaluate a single RAG response
pub async fn evaluate_single(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SingleEvaluationRequest>,
) -> Result<Json<EvaluationResponse>, ApiError> {
    let sample = EvaluationSample {
        question: request.question,
        answer: request.answer,
        contexts: request.contexts,
        ground_truth: request.ground_truth,
    };
    let metric_names = request.metrics.unwrap_or_else(default_metrics);

    let output = invoke(&state, vec![sample], metric_names)
        .await
        .map_err(|e| {
            error!(error = %e, "Single evaluation failed");
            ApiError::from(e)
        })?;

    let metrics = output.sample_scores.into_iter().next().unwrap_or_default();
    let overall_score = mean_of_valid(metrics.values().copied());

    Ok(Json(EvaluationResponse {
        metrics,
        overall_score,
        evaluation_time_ms: output.evaluation_time_ms,
        timestamp: timestamp(),
    }))
}

/// POST /evaluate/batch - Evaluate multiple RAG responses
pub async fn evaluate_batch(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BatchEvaluationRequest>,
) -> Result<Json<BatchEvaluationResponse>, ApiError> {
    validate_batch_size(request.samples.len(), state.config.evaluation.max_batch_size)?;

    let total_samples = request.samples.len();
    let metric_names = request.metrics.unwrap_or_else(default_metrics);

    let output = invoke(&state, request.samples, metric_names)
        .await
        .map_err(|e| {
            error!(error = %e, total_samples, "Batch evaluation failed");
            ApiError::from(e)
        })?;

    let overall = output.overall();
    let mut aggregate = output.aggregate;
    aggregate.insert("overall".to_string(), overall);

    Ok(Json(BatchEvaluationResponse {
        results: output.records,
        aggregate,
        total_samples,
        evaluation_time_ms: output.evaluation_time_ms,
        timestamp: timestamp(),
    }))
}
