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

//! Bounded evaluation pool
//!
//! Evaluations run as spawned tasks, off the request handler, with at most
//! `workers` of them in flight. Callers beyond that wait for a permit. An
//! optional deadline aborts an evaluation that runs too long.

use crate::config::EvaluationConfig;
use ragas_evals::EvalError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct EvaluationPool {
    /// Concurrency limiter
    semaphore: Arc<Semaphore>,
    timeout: Option<Duration>,
}

impl EvaluationPool {
    pub fn new(workers: usize, timeout: Option<Duration>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            timeout,
        }
    }

    pub fn from_config(config: &EvaluationConfig) -> Self {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        Self::new(config.workers, timeout)
    }

    /// Permits not currently held by a running evaluation
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run `job` on the pool and wait for its result
    pub async fn run<F, T>(&self, job: F) -> Result<T, EvalError>
    where
        F: Future<Output = Result<T, EvalError>> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EvalError::Internal("evaluation pool is closed".to_string()))?;

        debug!(available = self.available(), "Evaluation slot acquired");

        let mut handle = tokio::spawn(async move {
            let _permit = permit;
            job.await
        });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    // Dropping the aborted task releases its permit
                    handle.abort();
                    warn!(timeout_secs = limit.as_secs(), "Evaluation deadline exceeded");
                    return Err(EvalError::Timeout(limit.as_secs()));
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(EvalError::Panic(e.to_string())),
            Err(e) => Err(EvalError::Internal(format!("evaluation task cancelled: {}", e))),
        }
    }
}
