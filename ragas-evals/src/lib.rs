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

//! # Ragas Evaluation Engine
//!
//! LLM-as-judge metrics for retrieval-augmented generation.
//!
//! ## Features
//!
//! - **Four RAG metrics**: faithfulness, answer relevancy, context precision, context recall
//! - **Two judge backends**: hosted OpenAI chat completions or a local Ollama server
//! - **Tabular results**: one row per sample, one column per metric
//! - **NaN-safe output**: indeterminate scores surface as `None`, never as `0.0`
//!
//! ## Example
//!
//! ```rust,ignore
//! use ragas_evals::{evaluation, llm_client::OllamaClient, EvaluationSample};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = Arc::new(OllamaClient::new(
//!         "http://localhost:11434".to_string(),
//!         "llama3.2".to_string(),
//!     ));
//!
//!     let sample = EvaluationSample {
//!         question: "What is the capital of France?".to_string(),
//!         answer: "Paris".to_string(),
//!         contexts: vec!["Paris is the capital of France.".to_string()],
//!         ground_truth: None,
//!     };
//!
//!     let output = evaluation::run_evaluation(
//!         &[sample],
//!         &["faithfulness".to_string()],
//!         llm,
//!         &evaluation::EvaluateOptions::default(),
//!     )
//!     .await
//!     .unwrap();
//!     println!("{:?}", output.aggregate);
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

pub mod dataset;
pub mod evaluation;
pub mod llm_client;
pub mod metrics;
pub mod scores;

pub use dataset::{EvaluationDataset, EvaluationSample, SingleTurnSample};
pub use evaluation::{evaluate, run_evaluation, EvaluateOptions, EvaluationOutput, EvaluationResult};
pub use metrics::{build_metrics, resolve_metric_names, MetricInfo, MetricKind, DEFAULT_METRICS};
pub use scores::{clean_score, ScoreMap};

/// Version string of the scoring engine, reported by the service root endpoint.
pub const ENGINE_VERSION: &str = "0.2.x";

/// Core trait that all metrics must implement
#[async_trait]
pub trait Metric: Send + Sync {
    /// Which of the fixed metric identifiers this instance computes
    fn kind(&self) -> MetricKind;

    /// Column name in the result table
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Score a single sample.
    ///
    /// The returned value may be NaN when the judge output gives no basis for
    /// a score (for example an answer without any factual claims).
    async fn score(&self, sample: &SingleTurnSample) -> Result<f64, EvalError>;
}

/// Errors that can occur during evaluation
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("No valid metrics specified")]
    NoValidMetrics,

    #[error("LLM client error: {0}")]
    LLMClientError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Evaluation timed out after {0}s")]
    Timeout(u64),

    #[error("Task panicked: {0}")]
    Panic(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<llm_client::LLMError> for EvalError {
    fn from(err: llm_client::LLMError) -> Self {
        match err {
            llm_client::LLMError::ApiError(msg) => EvalError::LLMClientError(msg),
            other => EvalError::LLMClientError(other.to_string()),
        }
    }
}
