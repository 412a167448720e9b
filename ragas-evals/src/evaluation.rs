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

//! Dataset evaluation
//!
//! [`evaluate`] scores every (sample, metric) cell concurrently and returns a
//! table with one row per sample and one column per metric. Cells keep their
//! raw value, NaN included; cleaning happens when the table is converted to
//! records or aggregated.

use crate::dataset::{EvaluationDataset, EvaluationSample, SingleTurnSample};
use crate::llm_client::LLMClient;
use crate::metrics::build_metrics;
use crate::scores::{clean_score, mean_of_valid, nan_mean, ScoreMap};
use crate::{EvalError, Metric};
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// One converted result row: sample columns plus metric columns
pub type ScoreRecord = Map<String, Value>;

/// Options controlling a single evaluation run
#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    /// Abort on the first failed cell instead of recording it as NaN
    pub raise_exceptions: bool,

    /// Maximum number of judge calls in flight
    pub max_concurrency: usize,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            raise_exceptions: false,
            max_concurrency: 16,
        }
    }
}

/// A scored sample
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub sample: SingleTurnSample,
    /// Raw scores, one per metric in evaluation order
    pub scores: Vec<f64>,
}

/// Tabular evaluation result
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    metric_names: Vec<&'static str>,
    rows: Vec<ResultRow>,
}

impl EvaluationResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.metric_names.iter().position(|n| *n == name)
    }

    /// Raw values of one metric column
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row.scores[idx]).collect())
    }

    /// Mean of a metric column skipping non-finite cells (NaN if none remain)
    pub fn column_mean(&self, name: &str) -> Option<f64> {
        self.column(name).map(|values| nan_mean(&values))
    }

    /// Cleaned metric scores of one row
    pub fn row_scores(&self, row: usize) -> ScoreMap {
        self.metric_names
            .iter()
            .zip(&self.rows[row].scores)
            .map(|(name, value)| (name.to_string(), clean_score(*value)))
            .collect()
    }

    /// Per-metric means, cleaned
    pub fn aggregate(&self) -> ScoreMap {
        self.metric_names
            .iter()
            .filter_map(|name| {
                self.column_mean(name)
                    .map(|mean| (name.to_string(), clean_score(mean)))
            })
            .collect()
    }

    /// Convert to one JSON record per row, with non-finite scores as null
    pub fn to_records(&self) -> Vec<ScoreRecord> {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let mut record = match serde_json::to_value(&row.sample) {
                    Ok(Value::Object(map)) => map,
                    _ => Map::new(),
                };
                for (name, score) in self.row_scores(idx) {
                    record.insert(name, score.map_or(Value::Null, Value::from));
                }
                record
            })
            .collect()
    }
}

/// Score a dataset with the given metrics
pub async fn evaluate(
    dataset: &EvaluationDataset,
    metrics: &[Arc<dyn Metric>],
    options: &EvaluateOptions,
) -> Result<EvaluationResult, EvalError> {
    if metrics.is_empty() {
        return Err(EvalError::NoValidMetrics);
    }

    // Column check up front so a missing reference fails before any judge call
    if let Some(idx) = dataset.first_missing_reference() {
        if let Some(metric) = metrics.iter().find(|m| m.kind().requires_reference()) {
            return Err(EvalError::MissingField(format!(
                "reference (ground_truth) is required by {} but missing for sample {}",
                metric.name(),
                idx
            )));
        }
    }

    let cells = (0..dataset.len()).flat_map(|r| (0..metrics.len()).map(move |c| (r, c)));
    let outcomes: Vec<(usize, usize, Result<f64, EvalError>)> = stream::iter(cells)
        .map(|(r, c)| {
            let sample = &dataset.samples[r];
            let metric = &metrics[c];
            async move { (r, c, metric.score(sample).await) }
        })
        .buffered(options.max_concurrency.max(1))
        .collect()
        .await;

    let mut rows: Vec<ResultRow> = dataset
        .samples
        .iter()
        .map(|sample| ResultRow {
            sample: sample.clone(),
            scores: vec![f64::NAN; metrics.len()],
        })
        .collect();

    for (r, c, outcome) in outcomes {
        match outcome {
            Ok(value) => rows[r].scores[c] = value,
            Err(e) if options.raise_exceptions => return Err(e),
            Err(e) => {
                warn!(
                    metric = metrics[c].name(),
                    sample = r,
                    error = %e,
                    "Metric scoring failed, recording NaN"
                );
            }
        }
    }

    Ok(EvaluationResult {
        metric_names: metrics.iter().map(|m| m.name()).collect(),
        rows,
    })
}

/// Evaluation output in plain, serializable form
#[derive(Debug, Clone)]
pub struct EvaluationOutput {
    /// One record per sample (sample columns and metric columns)
    pub records: Vec<ScoreRecord>,
    /// Metric-only score map per sample
    pub sample_scores: Vec<ScoreMap>,
    /// Per-metric mean
    pub aggregate: ScoreMap,
    pub evaluation_time_ms: u64,
}

impl EvaluationOutput {
    /// Mean of the valid per-metric aggregates
    pub fn overall(&self) -> Option<f64> {
        mean_of_valid(self.aggregate.values().copied())
    }
}

/// Build the dataset, bind the requested metrics to the judge and evaluate
pub async fn run_evaluation(
    samples: &[EvaluationSample],
    metric_names: &[String],
    llm_client: Arc<dyn LLMClient>,
    options: &EvaluateOptions,
) -> Result<EvaluationOutput, EvalError> {
    let start = Instant::now();

    let dataset = EvaluationDataset::from(samples);
    let metrics = build_metrics(metric_names, llm_client.clone())?;

    info!(
        sample_count = samples.len(),
        metrics = ?metric_names,
        provider = llm_client.provider(),
        model = llm_client.model_name(),
        "Starting evaluation"
    );

    let result = evaluate(&dataset, &metrics, options).await?;
    let evaluation_time_ms = start.elapsed().as_millis() as u64;

    info!(
        evaluation_time_ms,
        sample_count = samples.len(),
        "Evaluation completed"
    );

    Ok(EvaluationOutput {
        records: result.to_records(),
        sample_scores: (0..result.len()).map(|i| result.row_scores(i)).collect(),
        aggregate: result.aggregate(),
        evaluation_time_ms,
    })
}
