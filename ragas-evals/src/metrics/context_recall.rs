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

//! Context recall: share of reference statements attributable to the context

use super::{format_chunks, judge, MetricKind};
use crate::{llm_client::LLMClient, EvalError, Metric, SingleTurnSample};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Classification {
    #[serde(default)]
    attributed: bool,
}

#[derive(Debug, Deserialize)]
struct RecallVerdict {
    classifications: Vec<Classification>,
}

pub struct ContextRecall {
    llm_client: Arc<dyn LLMClient>,
}

impl ContextRecall {
    pub fn new(llm_client: Arc<dyn LLMClient>) -> Self {
        Self { llm_client }
    }

    fn prompt(&self, question: &str, contexts: &[String], reference: &str) -> String {
        format!(
            r#"Classify each sentence of the reference answer as attributable to the retrieved context or not.

QUESTION:
{question}

RETRIEVED CONTEXT:
{context}

REFERENCE ANSWER:
{reference}

Break the reference answer into individual statements. For each statement,
decide whether it can be attributed to the retrieved context.

Respond in JSON:
{{
  "classifications": [
    {{"statement": "...", "attributed": true, "reason": "..."}},
    ...
  ]
}}"#,
            context = format_chunks(contexts),
        )
    }
}

#[async_trait]
impl Metric for ContextRecall {
    fn kind(&self) -> MetricKind {
        MetricKind::ContextRecall
    }

    async fn score(&self, sample: &SingleTurnSample) -> Result<f64, EvalError> {
        let reference = sample
            .reference
            .as_deref()
            .ok_or_else(|| EvalError::MissingField("reference".to_string()))?;

        let prompt = self.prompt(&sample.user_input, &sample.retrieved_contexts, reference);
        let verdict: RecallVerdict = judge(self.llm_client.as_ref(), self.kind(), prompt).await?;

        if verdict.classifications.is_empty() {
            return Ok(f64::NAN);
        }
        let attributed = verdict
            .classifications
            .iter()
            .filter(|c| c.attributed)
            .count();
        Ok(attributed as f64 / verdict.classifications.len() as f64)
    }
}
