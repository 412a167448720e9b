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

// Integration tests for the HTTP API
//
// The judge is replaced by a canned client so every route can be exercised
// without a running model server.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use ragas_evals::llm_client::{LLMClient, LLMError, LLMResponse, TokenUsage};
use ragas_server::api::AppState;
use ragas_server::build_router;
use ragas_server::config::ServerConfig;
use ragas_server::llm::LlmFactory;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Canned judge verdicts keyed by prompt markers
struct CannedJudge;

#[async_trait]
impl LLMClient for CannedJudge {
    async fn evaluate(&self, prompt: String) -> Result<LLMResponse, LLMError> {
        let content = if prompt.contains("Extract all atomic factual claims") {
            // No claims: faithfulness is indeterminate
            r#"{"claims": []}"#
        } else if prompt.contains("Evaluate how relevant") {
            r#"{"addresses_question": true, "noncommittal": false, "relevance_score": 0.8}"#
        } else if prompt.contains("Evaluate the precision") {
            r#"{"verdicts": [{"chunk_index": 0, "useful": true}]}"#
        } else if prompt.contains("Classify each sentence") {
            r#"{"classifications": [{"attributed": true}, {"attributed": false}]}"#
        } else {
            return Err(LLMError::ApiError("unexpected prompt".to_string()));
        };

        Ok(LLMResponse {
            content: content.to_string(),
            usage: TokenUsage::default(),
            model: "canned".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "canned"
    }

    fn provider(&self) -> &str {
        "test"
    }
}

fn app() -> (Router, Arc<AtomicUsize>) {
    let resolutions = Arc::new(AtomicUsize::new(0));
    let counter = resolutions.clone();
    let factory: LlmFactory = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(CannedJudge) as Arc<dyn LLMClient>
    });

    let state = AppState::with_llm_factory(ServerConfig::default(), factory);
    (build_router(state), resolutions)
}

fn sample(question: &str) -> Value {
    json!({
        "question": question,
        "answer": "Paris",
        "contexts": ["Paris is the capital of France."]
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn approx(value: &Value, expected: f64) -> bool {
    value.as_f64().map_or(false, |v| (v - expected).abs() < 1e-6)
}

#[tokio::test]
async fn test_health_lists_all_metrics() {
    let (app, resolutions) = app();
    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["llm_provider"], "ollama");
    assert_eq!(body["llm_model"], "llama3.2");
    assert_eq!(
        body["available_metrics"],
        json!(["faithfulness", "answer_relevancy", "context_precision", "context_recall"])
    );
    // Health never touches the judge
    assert_eq!(resolutions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_root_and_catalog() {
    let (app, _) = app();
    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "RAGAS Evaluation Microservice");
    assert_eq!(body["ragas_version"], "0.2.x");
    assert_eq!(body["endpoints"]["evaluate_batch"], "POST /evaluate/batch");

    let (app, _) = self::app();
    let (status, body) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_metrics"].as_object().unwrap().len(), 4);
    assert_eq!(body["available_metrics"]["faithfulness"]["range"], "0.0 - 1.0");
    assert_eq!(body["available_metrics"]["context_recall"]["higher_is_better"], true);
    assert_eq!(
        body["default_metrics"],
        json!(["faithfulness", "answer_relevancy", "context_precision"])
    );
}

#[tokio::test]
async fn test_single_indeterminate_metric_is_null() {
    let (app, _) = app();
    let mut request = sample("What is the capital of France?");
    request["metrics"] = json!(["faithfulness"]);

    let (status, body) = post(app, "/evaluate", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metrics"], json!({"faithfulness": null}));
    assert_eq!(body["overall_score"], Value::Null);
    assert!(body["evaluation_time_ms"].is_u64());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_single_default_metrics_overall_skips_null() {
    let (app, resolutions) = app();
    let (status, body) = post(app, "/evaluate", sample("What is the capital of France?")).await;

    assert_eq!(status, StatusCode::OK);
    let metrics = body["metrics"].as_object().unwrap();
    assert_eq!(metrics.len(), 3);
    assert_eq!(metrics["faithfulness"], Value::Null);
    assert!(approx(&metrics["answer_relevancy"], 0.8));
    assert!(approx(&metrics["context_precision"], 1.0));
    assert!(approx(&body["overall_score"], 0.9));
    assert_eq!(resolutions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_single_unknown_metrics_only_is_500() {
    let (app, _) = app();
    let mut request = sample("q");
    request["metrics"] = json!(["bleu", "rouge"]);

    let (status, body) = post(app, "/evaluate", request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "No valid metrics specified");
}

#[tokio::test]
async fn test_single_unknown_metric_is_dropped() {
    let (app, _) = app();
    let mut request = sample("q");
    request["metrics"] = json!(["answer_relevancy", "bleu"]);

    let (status, body) = post(app, "/evaluate", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metrics"].as_object().unwrap().len(), 1);
    assert!(approx(&body["overall_score"], 0.8));
}

#[tokio::test]
async fn test_context_recall_requires_ground_truth() {
    let (app, _) = app();
    let mut request = sample("q");
    request["metrics"] = json!(["context_recall"]);

    let (status, body) = post(app, "/evaluate", request.clone()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("context_recall"));

    request["ground_truth"] = json!("Paris is the capital. It is in Europe.");
    let (app, _) = self::app();
    let (status, body) = post(app, "/evaluate", request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(approx(&body["metrics"]["context_recall"], 0.5));
}

#[tokio::test]
async fn test_batch_empty_rejected_before_evaluation() {
    let (app, resolutions) = app();
    let (status, body) = post(app, "/evaluate/batch", json!({"samples": []})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "At least one sample required");
    assert_eq!(resolutions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_batch_over_limit_rejected_before_evaluation() {
    let (app, resolutions) = app();
    let samples: Vec<Value> = (0..101).map(|i| sample(&format!("q{}", i))).collect();
    let (status, body) = post(app, "/evaluate/batch", json!({ "samples": samples })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Maximum 100 samples per batch");
    assert_eq!(resolutions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_batch_results_and_aggregate() {
    let (app, resolutions) = app();
    let samples: Vec<Value> = (0..3).map(|i| sample(&format!("q{}", i))).collect();
    let request = json!({
        "samples": samples,
        "metrics": ["faithfulness", "answer_relevancy"]
    });

    let (status, body) = post(app, "/evaluate/batch", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_samples"], 3);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[1]["user_input"], "q1");
    assert_eq!(results[1]["response"], "Paris");
    assert_eq!(results[1]["faithfulness"], Value::Null);
    assert!(approx(&results[1]["answer_relevancy"], 0.8));

    assert_eq!(body["aggregate"]["faithfulness"], Value::Null);
    assert!(approx(&body["aggregate"]["answer_relevancy"], 0.8));
    assert!(approx(&body["aggregate"]["overall"], 0.8));
    // One judge resolution per evaluation, not per sample
    assert_eq!(resolutions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_batch_at_limit_accepted() {
    let (app, _) = app();
    let samples: Vec<Value> = (0..100).map(|i| sample(&format!("q{}", i))).collect();
    let request = json!({ "samples": samples, "metrics": ["answer_relevancy"] });

    let (status, body) = post(app, "/evaluate/batch", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_samples"], 100);
    assert_eq!(body["results"].as_array().unwrap().len(), 100);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let (app, resolutions) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/evaluate")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"question": "q", "answer": 3}"#))
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("answer"));
    assert_eq!(resolutions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_json_body_uses_detail_shape() {
    let (app, resolutions) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/evaluate/batch")
        .header("content-type", "text/plain")
        .body(Body::from("samples"))
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["detail"].is_string());
    assert_eq!(resolutions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_full_batch_with_long_contexts_accepted() {
    let (app, _) = app();
    let context = "Paris is the capital of France. ".repeat(800);
    let samples: Vec<Value> = (0..100)
        .map(|i| {
            json!({
                "question": format!("q{}", i),
                "answer": "Paris",
                "contexts": [context.clone()]
            })
        })
        .collect();
    let request = json!({ "samples": samples, "metrics": ["answer_relevancy"] });
    // Well past axum's stock 2 MB body ceiling
    assert!(request.to_string().len() > 2_500_000);

    let (status, body) = post(app, "/evaluate/batch", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_samples"], 100);
    assert_eq!(body["results"].as_array().unwrap().len(), 100);
}

#[tokio::test]
async fn test_body_over_configured_limit_uses_detail_shape() {
    let mut config = ServerConfig::default();
    config.server.max_body_bytes = 1024;
    let factory: LlmFactory = Arc::new(|| Arc::new(CannedJudge) as Arc<dyn LLMClient>);
    let app = build_router(AppState::with_llm_factory(config, factory));

    let mut request = sample("q");
    request["contexts"] = json!(["x".repeat(4096)]);
    let (status, body) = post(app, "/evaluate", request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["detail"].is_string());
}
