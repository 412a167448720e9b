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

//! HTTP API handlers

pub mod evaluate;
pub mod health;

pub use evaluate::{evaluate_batch, evaluate_single};
pub use health::{health_check, metrics_info, root};

use crate::config::ServerConfig;
use crate::llm::{llm_factory, LlmFactory};
use crate::pool::EvaluationPool;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ragas_evals::EvalError;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// Body could not be read as the expected JSON document
    #[error("Rejected request body ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Rejected { status, message } => (status, message),
        };

        (status, Json(ErrorResponse { detail: message })).into_response()
    }
}

impl From<EvalError> for ApiError {
    fn from(err: EvalError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// `Json` extractor whose rejections use the `{"detail": ...}` error body
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub pool: EvaluationPool,
    /// Resolves the judge LLM for each evaluation
    pub llm_factory: LlmFactory,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let factory = llm_factory(config.llm.clone());
        Self::with_llm_factory(config, factory)
    }

    pub fn with_llm_factory(config: ServerConfig, llm_factory: LlmFactory) -> Self {
        Self {
            pool: EvaluationPool::from_config(&config.evaluation),
            config: Arc::new(config),
            llm_factory,
        }
    }
}
