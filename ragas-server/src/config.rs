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

use anyhow::Result;
use ragas_evals::llm_client::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Ragas Server Configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub llm: LLMConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP API listen address (e.g., "0.0.0.0:8001")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Allowed CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LLMConfig {
    /// Judge provider: "ollama" or "openai"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Ollama base URL
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,

    /// Ollama model tag
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    /// OpenAI API key
    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationConfig {
    /// Evaluations allowed to run at once
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Deadline for a single evaluation in seconds (0 = no deadline)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum samples per batch request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Fail the whole evaluation on the first metric error
    #[serde(default)]
    pub raise_exceptions: bool,

    /// Judge calls in flight within one evaluation
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human-readable format
    #[serde(default = "default_log_json")]
    pub json: bool,
}

// Default values
fn default_http_addr() -> String {
    "0.0.0.0:8001".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3007".to_string(),
        "http://backend:3007".to_string(),
    ]
}

// Room for a full batch with long retrieved contexts
fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_openai_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_workers() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_batch_size() -> usize {
    100
}

fn default_max_concurrency() -> usize {
    16
}

fn default_log_json() -> bool {
    true
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            cors_origins: default_cors_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            ollama_base_url: default_ollama_base_url(),
            ollama_model: default_ollama_model(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_base_url: default_openai_base_url(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timeout_secs: default_timeout_secs(),
            max_batch_size: default_max_batch_size(),
            raise_exceptions: false,
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: default_log_json(),
        }
    }
}

/// Replace the port of a `host:port` address
fn with_port(listen_addr: &str, port: &str) -> String {
    let host = listen_addr
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(listen_addr);
    format!("{}:{}", host, port)
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overwrite the fields whose variables are present in `lookup`
    fn apply_lookup<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server configuration
        if let Some(addr) = lookup("RAGAS_HTTP_ADDR") {
            self.server.listen_addr = addr;
        }

        if let Some(port) = lookup("RAGAS_SERVICE_PORT") {
            self.server.listen_addr = with_port(&self.server.listen_addr, port.trim());
        }

        if let Some(val) = lookup("RAGAS_MAX_BODY_BYTES").and_then(|v| v.parse().ok()) {
            self.server.max_body_bytes = val;
        }

        if let Some(origins) = lookup("RAGAS_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        // LLM configuration
        if let Some(provider) = lookup("RAGAS_LLM_PROVIDER") {
            self.llm.provider = provider.trim().to_lowercase();
        }

        if let Some(base_url) = lookup("OLLAMA_BASE_URL") {
            self.llm.ollama_base_url = base_url;
        }

        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.llm.ollama_model = model;
        }

        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(key);
        }

        if let Some(model) = lookup("OPENAI_MODEL") {
            self.llm.openai_model = model;
        }

        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            self.llm.openai_base_url = base_url;
        }

        // Evaluation configuration
        if let Some(val) = lookup("RAGAS_EVAL_WORKERS").and_then(|v| v.parse().ok()) {
            self.evaluation.workers = val;
        }

        if let Some(val) = lookup("RAGAS_EVAL_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.evaluation.timeout_secs = val;
        }

        if let Some(val) = lookup("RAGAS_MAX_BATCH_SIZE").and_then(|v| v.parse().ok()) {
            self.evaluation.max_batch_size = val;
        }

        if let Some(raise) = lookup("RAGAS_RAISE_EXCEPTIONS") {
            self.evaluation.raise_exceptions = raise.parse().unwrap_or(false);
        }

        if let Some(val) = lookup("RAGAS_EVAL_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.evaluation.max_concurrency = val;
        }

        // Logging configuration
        if let Some(json) = lookup("RAGAS_LOG_JSON") {
            self.logging.json = json.parse().unwrap_or(true);
        }
    }

    /// Load configuration with priority: env > file > defaults
    ///
    /// Supported environment variables:
    /// - RAGAS_HTTP_ADDR: HTTP listen address (default: 0.0.0.0:8001)
    /// - RAGAS_SERVICE_PORT: Port only, keeps the host of the listen address
    /// - RAGAS_MAX_BODY_BYTES: Request body ceiling (default: 32 MiB)
    /// - RAGAS_CORS_ORIGINS: Comma-separated allowed origins
    /// - RAGAS_LLM_PROVIDER: "ollama" (default) or "openai"
    /// - OLLAMA_BASE_URL / OLLAMA_MODEL: Local judge (default: http://localhost:11434, llama3.2)
    /// - OPENAI_API_KEY / OPENAI_MODEL / OPENAI_BASE_URL: Hosted judge
    /// - RAGAS_EVAL_WORKERS: Concurrent evaluations (default: 4)
    /// - RAGAS_EVAL_TIMEOUT_SECS: Per-evaluation deadline, 0 disables (default: 300)
    /// - RAGAS_MAX_BATCH_SIZE: Batch ceiling (default: 100)
    /// - RAGAS_RAISE_EXCEPTIONS: Abort on the first metric error (default: false)
    /// - RAGAS_EVAL_CONCURRENCY: Judge calls in flight per evaluation (default: 16)
    /// - RAGAS_LOG_JSON: JSON log output (default: true)
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::load`] with an arbitrary variable source
    pub fn load_with<F>(config_file: Option<PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        // Only variables that are explicitly set override the file
        config.apply_lookup(&lookup);

        Ok(config)
    }

    /// Parse listen address as SocketAddr
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.server.listen_addr.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Validate socket address
        self.socket_addr()?;

        if self.server.max_body_bytes == 0 {
            anyhow::bail!("server.max_body_bytes must be at least 1");
        }

        if self.evaluation.workers == 0 {
            anyhow::bail!("evaluation.workers must be at least 1");
        }

        if self.evaluation.max_batch_size == 0 {
            anyhow::bail!("evaluation.max_batch_size must be at least 1");
        }

        if self.evaluation.max_concurrency == 0 {
            anyhow::bail!("evaluation.max_concurrency must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8001");
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.ollama_model, "llama3.2");
        assert_eq!(config.llm.openai_model, "gpt-4o-mini");
        assert_eq!(config.evaluation.workers, 4);
        assert_eq!(config.evaluation.max_batch_size, 100);
        assert!(!config.evaluation.raise_exceptions);
        assert_eq!(config.server.cors_origins.len(), 2);
        assert!(config.server.max_body_bytes > 2 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::load_with(None, lookup(&[
            ("RAGAS_LLM_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "sk-test"),
            ("RAGAS_EVAL_WORKERS", "8"),
            ("RAGAS_EVAL_TIMEOUT_SECS", "not-a-number"),
            ("RAGAS_CORS_ORIGINS", "http://a:1, http://b:2,"),
            ("RAGAS_LOG_JSON", "false"),
            ("RAGAS_MAX_BODY_BYTES", "1048576"),
        ]))
        .unwrap();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.evaluation.workers, 8);
        // Unparsable values keep the default
        assert_eq!(config.evaluation.timeout_secs, 300);
        assert_eq!(config.server.cors_origins, vec!["http://a:1", "http://b:2"]);
        assert!(!config.logging.json);
        assert_eq!(config.server.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn test_service_port_keeps_host() {
        let config = ServerConfig::load_with(
            None,
            lookup(&[
                ("RAGAS_HTTP_ADDR", "127.0.0.1:9000"),
                ("RAGAS_SERVICE_PORT", "8123"),
            ]),
        )
        .unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8123");
        assert_eq!(config.socket_addr().unwrap().port(), 8123);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.server.listen_addr = "not an address".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.evaluation.workers = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.evaluation.max_batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.server.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragas.toml");
        std::fs::write(
            &path,
            r#"
[llm]
provider = "openai"
openai_model = "gpt-4o"

[evaluation]
workers = 2
"#,
        )
        .unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.openai_model, "gpt-4o");
        assert_eq!(config.llm.ollama_base_url, "http://localhost:11434");
        assert_eq!(config.evaluation.workers, 2);
        assert_eq!(config.evaluation.max_batch_size, 100);
        assert_eq!(config.server.listen_addr, "0.0.0.0:8001");

        // Environment wins over the file, unset variables leave it alone
        let config =
            ServerConfig::load_with(Some(path), lookup(&[("RAGAS_EVAL_WORKERS", "6")])).unwrap();
        assert_eq!(config.evaluation.workers, 6);
        assert_eq!(config.llm.openai_model, "gpt-4o");
    }
}
