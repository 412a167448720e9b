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

//! Faithfulness: decompose-then-verify
//!
//! 1. Extract atomic claims from the answer
//! 2. Verify each claim against the joined contexts
//! 3. Score = supported claims / total claims
//!
//! An answer with no factual claims has no basis for a score and yields NaN.

use super::{judge, MetricKind};
use crate::{llm_client::LLMClient, EvalError, Metric, SingleTurnSample};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

fn claim_extraction_prompt(question: &str, answer: &str) -> String {
    format!(
        r#"Extract all atomic factual claims from the following answer.

QUESTION:
{question}

ANSWER:
{answer}

Rules:
- Extract ONLY factual claims (not opinions, hedged statements, or questions)
- Each claim should be self-contained and independently verifiable
- Decompose compound claims into atomic parts
- Use the same words as the original answer when possible

Respond in JSON:
{{
  "claims": ["<factual statement>", ...]
}}

If there are no factual claims, respond with: {{"claims": []}}
"#
    )
}

fn verification_prompt(context: &str, claims: &str) -> String {
    format!(
        r#"Verify each claim against the provided context.

CONTEXT:
{context}

CLAIMS TO VERIFY:
{claims}

For each claim, decide whether it can be directly inferred from the context.

Respond in JSON:
{{
  "verifications": [
    {{"claim": "<the claim>", "supported": true | false, "reason": "<short reason>"}},
    ...
  ]
}}
"#
    )
}

#[derive(Debug, Deserialize)]
struct ClaimList {
    #[serde(default)]
    claims: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Verification {
    #[serde(default)]
    supported: bool,
}

#[derive(Debug, Deserialize)]
struct VerificationList {
    verifications: Vec<Verification>,
}

/// Fraction of the answer's claims supported by the retrieved context
pub struct Faithfulness {
    llm_client: Arc<dyn LLMClient>,
}

impl Faithfulness {
    pub fn new(llm_client: Arc<dyn LLMClient>) -> Self {
        Self { llm_client }
    }

    async fn extract_claims(&self, sample: &SingleTurnSample) -> Result<Vec<String>, EvalError> {
        let prompt = claim_extraction_prompt(&sample.user_input, &sample.response);
        let list: ClaimList = judge(self.llm_client.as_ref(), self.kind(), prompt).await?;
        Ok(list
            .claims
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect())
    }

    async fn verify_claims(
        &self,
        claims: &[String],
        contexts: &[String],
    ) -> Result<Vec<Verification>, EvalError> {
        let claims_formatted = claims
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}", i + 1, c))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = verification_prompt(&contexts.join("\n\n"), &claims_formatted);
        let list: VerificationList = judge(self.llm_client.as_ref(), self.kind(), prompt).await?;
        Ok(list.verifications)
    }
}

#[async_trait]
impl Metric for Faithfulness {
    fn kind(&self) -> MetricKind {
        MetricKind::Faithfulness
    }

    async fn score(&self, sample: &SingleTurnSample) -> Result<f64, EvalError> {
        let claims = self.extract_claims(sample).await?;
        if claims.is_empty() {
            return Ok(f64::NAN);
        }

        let verifications = self
            .verify_claims(&claims, &sample.retrieved_contexts)
            .await?;
        if verifications.is_empty() {
            return Ok(f64::NAN);
        }

        if verifications.len() != claims.len() {
            warn!(
                claims = claims.len(),
                verifications = verifications.len(),
                "Judge returned a verdict count that does not match the claims"
            );
        }

        // Claims the judge left out count as unsupported
        let supported = verifications
            .iter()
            .take(claims.len())
            .filter(|v| v.supported)
            .count();
        Ok(supported as f64 / claims.len() as f64)
    }
}
