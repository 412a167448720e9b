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

//! RAG metrics and the factory that binds them to a judge LLM
//!
//! - Faithfulness: Is the answer faithful to the context?
//! - Answer Relevancy: Does the answer address the question?
//! - Context Precision: Are the retrieved chunks useful, and ranked first?
//! - Context Recall: Does the context cover the reference answer?

pub mod answer_relevancy;
pub mod context_precision;
pub mod context_recall;
pub mod faithfulness;

pub use answer_relevancy::AnswerRelevancy;
pub use context_precision::ContextPrecision;
pub use context_recall::ContextRecall;
pub use faithfulness::Faithfulness;

use crate::llm_client::LLMClient;
use crate::{EvalError, Metric};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// The fixed set of metric identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    Faithfulness,
    AnswerRelevancy,
    ContextPrecision,
    ContextRecall,
}

/// Metrics evaluated when a request does not name any
pub const DEFAULT_METRICS: [MetricKind; 3] = [
    MetricKind::Faithfulness,
    MetricKind::AnswerRelevancy,
    MetricKind::ContextPrecision,
];

/// Catalog entry describing a metric
#[derive(Debug, Clone, Serialize)]
pub struct MetricInfo {
    pub description: &'static str,
    pub range: &'static str,
    pub higher_is_better: bool,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Faithfulness,
        MetricKind::AnswerRelevancy,
        MetricKind::ContextPrecision,
        MetricKind::ContextRecall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Faithfulness => "faithfulness",
            MetricKind::AnswerRelevancy => "answer_relevancy",
            MetricKind::ContextPrecision => "context_precision",
            MetricKind::ContextRecall => "context_recall",
        }
    }

    /// Whether the metric needs `reference` on every sample
    pub fn requires_reference(&self) -> bool {
        matches!(self, MetricKind::ContextRecall)
    }

    pub fn info(&self) -> MetricInfo {
        let description = match self {
            MetricKind::Faithfulness => {
                "Measures if the answer is grounded in the retrieved context"
            }
            MetricKind::AnswerRelevancy => "Measures if the answer is relevant to the question",
            MetricKind::ContextPrecision => {
                "Measures if retrieved contexts are relevant to the question"
            }
            MetricKind::ContextRecall => {
                "Measures if context contains info needed to answer (requires ground_truth)"
            }
        };
        MetricInfo {
            description,
            range: "0.0 - 1.0",
            higher_is_better: true,
        }
    }

    /// Instantiate the metric bound to a judge
    pub fn instantiate(&self, llm_client: Arc<dyn LLMClient>) -> Arc<dyn Metric> {
        match self {
            MetricKind::Faithfulness => Arc::new(Faithfulness::new(llm_client)),
            MetricKind::AnswerRelevancy => Arc::new(AnswerRelevancy::new(llm_client)),
            MetricKind::ContextPrecision => Arc::new(ContextPrecision::new(llm_client)),
            MetricKind::ContextRecall => Arc::new(ContextRecall::new(llm_client)),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EvalError::InvalidInput(format!("Unknown metric: {}", s)))
    }
}

/// Map requested names to known metrics.
///
/// Unknown names are logged and skipped; duplicates keep their first position.
pub fn resolve_metric_names(names: &[String]) -> Vec<MetricKind> {
    let mut kinds = Vec::with_capacity(names.len());
    for name in names {
        match name.parse::<MetricKind>() {
            Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Ok(_) => debug!(metric = %name, "Duplicate metric ignored"),
            Err(_) => warn!(metric = %name, "Unknown metric"),
        }
    }
    kinds
}

/// Build metric instances for the requested names
pub fn build_metrics(
    names: &[String],
    llm_client: Arc<dyn LLMClient>,
) -> Result<Vec<Arc<dyn Metric>>, EvalError> {
    let metrics: Vec<Arc<dyn Metric>> = resolve_metric_names(names)
        .into_iter()
        .map(|kind| kind.instantiate(llm_client.clone()))
        .collect();

    if metrics.is_empty() {
        return Err(EvalError::NoValidMetrics);
    }
    Ok(metrics)
}

/// Run one judge prompt and decode the verdict
pub(crate) async fn judge<T: DeserializeOwned>(
    llm_client: &dyn LLMClient,
    metric: MetricKind,
    prompt: String,
) -> Result<T, EvalError> {
    let response = llm_client.evaluate(prompt).await?;
    debug!(
        metric = %metric,
        model = %response.model,
        total_tokens = response.usage.total_tokens,
        "Judge responded"
    );
    response
        .parse()
        .map_err(|e| EvalError::LLMClientError(format!("{} verdict parse error: {}", metric, e)))
}

/// Render contexts as numbered chunks
pub(crate) fn format_chunks(contexts: &[String]) -> String {
    contexts
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[Chunk {}]: {}", i, c))
        .collect::<Vec<_>>()
        .join("\n\n")
}
