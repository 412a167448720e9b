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

//! Context precision without a reference answer
//!
//! The judge marks each retrieved chunk as useful or not for producing the
//! answer. The score is the average precision of those verdicts in retrieval
//! order, so useful chunks ranked late pull the score down.

use super::{format_chunks, judge, MetricKind};
use crate::{llm_client::LLMClient, EvalError, Metric, SingleTurnSample};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ChunkVerdict {
    chunk_index: usize,
    useful: bool,
}

#[derive(Debug, Deserialize)]
struct PrecisionVerdict {
    verdicts: Vec<ChunkVerdict>,
}

/// Ranked usefulness of the retrieved chunks
pub struct ContextPrecision {
    llm_client: Arc<dyn LLMClient>,
}

impl ContextPrecision {
    pub fn new(llm_client: Arc<dyn LLMClient>) -> Self {
        Self { llm_client }
    }

    fn prompt(&self, question: &str, contexts: &[String], answer: &str) -> String {
        format!(
            r#"Evaluate the precision of the retrieved context for answering the question.

QUESTION:
{question}

RETRIEVED CONTEXT (in order):
{context}

ANSWER:
{answer}

For each piece of context, determine if it was useful in arriving at the answer.

Respond in JSON:
{{
  "verdicts": [
    {{"chunk_index": 0, "useful": true, "reason": "..."}},
    ...
  ]
}}"#,
            context = format_chunks(contexts),
        )
    }
}

/// Average precision over binary verdicts in rank order
pub(crate) fn average_precision(verdicts: &[bool]) -> f64 {
    let mut hits = 0usize;
    let mut numerator = 0.0;
    for (rank, &useful) in verdicts.iter().enumerate() {
        if useful {
            hits += 1;
            numerator += hits as f64 / (rank + 1) as f64;
        }
    }
    numerator / (hits as f64 + 1e-10)
}

#[async_trait]
impl Metric for ContextPrecision {
    fn kind(&self) -> MetricKind {
        MetricKind::ContextPrecision
    }

    async fn score(&self, sample: &SingleTurnSample) -> Result<f64, EvalError> {
        let contexts = &sample.retrieved_contexts;
        if contexts.is_empty() {
            return Ok(f64::NAN);
        }

        let prompt = self.prompt(&sample.user_input, contexts, &sample.response);
        let verdict: PrecisionVerdict =
            judge(self.llm_client.as_ref(), self.kind(), prompt).await?;

        // Chunks the judge skipped count as not useful
        let mut ranked = vec![false; contexts.len()];
        for v in verdict.verdicts {
            if let Some(slot) = ranked.get_mut(v.chunk_index) {
                *slot = v.useful;
            }
        }
        Ok(average_precision(&ranked))
    }
}
