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

//! Answer relevancy: does the answer address the question?

use super::{judge, MetricKind};
use crate::{llm_client::LLMClient, EvalError, Metric, SingleTurnSample};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct RelevanceVerdict {
    relevance_score: f64,
    #[serde(default)]
    noncommittal: bool,
}

/// Judge-rated relevance of the answer to the question.
///
/// Evasive answers ("I don't know", "it depends") score 0 regardless of the
/// rated relevance.
pub struct AnswerRelevancy {
    llm_client: Arc<dyn LLMClient>,
}

impl AnswerRelevancy {
    pub fn new(llm_client: Arc<dyn LLMClient>) -> Self {
        Self { llm_client }
    }

    fn prompt(&self, question: &str, answer: &str) -> String {
        format!(
            r#"Evaluate how relevant the answer is to the question.

QUESTION:
{question}

ANSWER:
{answer}

Determine:
1. Does the answer directly address the question?
2. Is the answer complete?
3. Is the answer noncommittal (evasive, vague, or "I don't know")?

Respond in JSON:
{{
  "addresses_question": <boolean>,
  "noncommittal": <boolean>,
  "relevance_score": <float 0-1>,
  "reasoning": "<explanation>"
}}"#
        )
    }
}

#[async_trait]
impl Metric for AnswerRelevancy {
    fn kind(&self) -> MetricKind {
        MetricKind::AnswerRelevancy
    }

    async fn score(&self, sample: &SingleTurnSample) -> Result<f64, EvalError> {
        let prompt = self.prompt(&sample.user_input, &sample.response);
        let verdict: RelevanceVerdict =
            judge(self.llm_client.as_ref(), self.kind(), prompt).await?;

        if verdict.noncommittal {
            return Ok(0.0);
        }
        // NaN passes through clamp untouched
        Ok(verdict.relevance_score.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::mock::ScriptedLLMClient;

    fn sample() -> SingleTurnSample {
        SingleTurnSample {
            user_input: "What is the capital of France?".to_string(),
            response: "Paris".to_string(),
            retrieved_contexts: vec![],
            reference: None,
        }
    }

    #[tokio::test]
    async fn test_relevance_score_clamped() {
        let llm = Arc::new(ScriptedLLMClient::new(vec![(
            "Evaluate how relevant",
            r#"{"addresses_question": true, "noncommittal": false, "relevance_score": 1.3}"#,
        )]));
        let score = AnswerRelevancy::new(llm).score(&sample()).await.unwrap();
        assert_eq!(score, 1.0);
    }

    #[tokio::test]
    async fn test_noncommittal_scores_zero() {
        let llm = Arc::new(ScriptedLLMClient::new(vec![(
            "Evaluate how relevant",
            r#"{"addresses_question": false, "noncommittal": true, "relevance_score": 0.6}"#,
        )]));
        let score = AnswerRelevancy::new(llm).score(&sample()).await.unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_missing_score_is_error() {
        let llm = Arc::new(ScriptedLLMClient::new(vec![(
            "Evaluate how relevant",
            r#"{"addresses_question": true}"#,
        )]));
        let result = tokio_test::block_on(AnswerRelevancy::new(llm).score(&sample()));
        assert!(matches!(result, Err(EvalError::LLMClientError(_))));
    }
}
