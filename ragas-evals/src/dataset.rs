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

//! Evaluation samples and the dataset handed to [`crate::evaluate`]

use serde::{Deserialize, Serialize};

/// A question/answer/contexts tuple as submitted by API callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSample {
    /// The user's question
    pub question: String,

    /// The generated answer
    pub answer: String,

    /// Retrieved context passages, in retrieval order
    pub contexts: Vec<String>,

    /// Expected answer (needed for context recall)
    #[serde(default)]
    pub ground_truth: Option<String>,
}

/// Single-turn record scored by the metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleTurnSample {
    pub user_input: String,
    pub response: String,
    pub retrieved_contexts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl From<&EvaluationSample> for SingleTurnSample {
    fn from(sample: &EvaluationSample) -> Self {
        Self {
            user_input: sample.question.clone(),
            response: sample.answer.clone(),
            retrieved_contexts: sample.contexts.clone(),
            // An empty ground truth is treated the same as an absent one
            reference: sample
                .ground_truth
                .as_ref()
                .filter(|gt| !gt.is_empty())
                .cloned(),
        }
    }
}

/// Ordered collection of single-turn samples
#[derive(Debug, Clone, Default)]
pub struct EvaluationDataset {
    pub samples: Vec<SingleTurnSample>,
}

impl EvaluationDataset {
    pub fn new(samples: Vec<SingleTurnSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the first sample without a reference, if any
    pub fn first_missing_reference(&self) -> Option<usize> {
        self.samples.iter().position(|s| s.reference.is_none())
    }
}

impl From<&[EvaluationSample]> for EvaluationDataset {
    fn from(samples: &[EvaluationSample]) -> Self {
        Self::new(samples.iter().map(SingleTurnSample::from).collect())
    }
}
