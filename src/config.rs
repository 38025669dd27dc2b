use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::diagnosis::DEFAULT_PROOF_DEPTH;
use crate::extraction::{
    ExtractionError, GeminiClient, LlmClient, OllamaClient, UnconfiguredClient,
    DEFAULT_GEMINI_MODEL, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL,
};
use crate::kb::{RuleSource, DEFAULT_MAX_PROOFS};

/// Application-level constants
pub const APP_NAME: &str = "NeuroDx";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "neurodx=info,tower_http=info"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    Ollama,
}

/// Symptom-extractor backend settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Build the configured client. A Gemini provider without an API key
    /// yields a client that fails every call, so the server still starts and
    /// `/diagnosis` reports the extractor as unavailable.
    pub fn build_client(&self) -> Result<Arc<dyn LlmClient>, ExtractionError> {
        match self.provider {
            LlmProvider::Gemini => match &self.gemini_api_key {
                Some(key) => Ok(Arc::new(GeminiClient::new(
                    key,
                    &self.gemini_model,
                    self.timeout_secs,
                )?)),
                None => {
                    tracing::warn!("GEMINI_API_KEY is not set; symptom extraction is disabled");
                    Ok(Arc::new(UnconfiguredClient::new("GEMINI_API_KEY is not set")))
                }
            },
            LlmProvider::Ollama => Ok(Arc::new(OllamaClient::new(
                &self.ollama_url,
                &self.ollama_model,
                self.timeout_secs,
            )?)),
        }
    }
}

/// Runtime configuration, read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub cors_origins: Vec<String>,
    pub llm: LlmConfig,
    pub rules: RuleSource,
    pub proof_depth: u32,
    pub max_proofs: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = match get("NEURODX_LLM_PROVIDER").as_deref() {
            None | Some("gemini") => LlmProvider::Gemini,
            Some("ollama") => LlmProvider::Ollama,
            Some(other) => {
                return Err(invalid("NEURODX_LLM_PROVIDER", other, "expected gemini or ollama"))
            }
        };

        let bind = get("NEURODX_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse()
            .map_err(|e: std::net::AddrParseError| invalid("NEURODX_BIND", &bind, &e.to_string()))?;

        let cors_origins: Vec<String> = get("NEURODX_CORS_ORIGINS")
            .map(|list| {
                list.split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec![DEFAULT_CORS_ORIGIN.to_string()]);

        let rules = get("NEURODX_RULES_PATH")
            .map(|p| RuleSource::File(PathBuf::from(p)))
            .unwrap_or(RuleSource::Bundled);

        let proof_depth = parse_number(&get, "NEURODX_PROOF_DEPTH", DEFAULT_PROOF_DEPTH)?;
        let max_proofs = parse_number(&get, "NEURODX_MAX_PROOFS", DEFAULT_MAX_PROOFS)?;
        let timeout_secs = parse_number(&get, "NEURODX_LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?;
        if max_proofs == 0 {
            return Err(invalid("NEURODX_MAX_PROOFS", "0", "must be at least 1"));
        }
        if timeout_secs == 0 {
            return Err(invalid("NEURODX_LLM_TIMEOUT_SECS", "0", "must be at least 1"));
        }

        Ok(Self {
            bind,
            cors_origins,
            llm: LlmConfig {
                provider,
                gemini_api_key: get("GEMINI_API_KEY"),
                gemini_model: get("NEURODX_GEMINI_MODEL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                ollama_url: get("NEURODX_OLLAMA_URL")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                ollama_model: get("NEURODX_OLLAMA_MODEL")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
                timeout_secs,
            },
            rules,
            proof_depth,
            max_proofs,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| invalid(var, &raw, &e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| map.get(var).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.cors_origins, vec![DEFAULT_CORS_ORIGIN]);
        assert_eq!(config.llm.provider, LlmProvider::Gemini);
        assert_eq!(config.llm.gemini_api_key, None);
        assert_eq!(config.llm.gemini_model, "gemini-2.0-flash-001");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.rules, RuleSource::Bundled);
        assert_eq!(config.proof_depth, 3);
        assert_eq!(config.max_proofs, DEFAULT_MAX_PROOFS);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("GEMINI_API_KEY", " abc "),
            ("NEURODX_LLM_PROVIDER", "ollama"),
            ("NEURODX_OLLAMA_MODEL", "mistral"),
            ("NEURODX_BIND", "0.0.0.0:9000"),
            ("NEURODX_CORS_ORIGINS", "http://a.test/, http://b.test ,"),
            ("NEURODX_RULES_PATH", "/etc/neurodx/rules.metta"),
            ("NEURODX_PROOF_DEPTH", "5"),
            ("NEURODX_MAX_PROOFS", "10"),
            ("NEURODX_LLM_TIMEOUT_SECS", "15"),
        ])
        .unwrap();
        assert_eq!(config.llm.gemini_api_key.as_deref(), Some("abc"));
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.ollama_model, "mistral");
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(
            config.rules,
            RuleSource::File(PathBuf::from("/etc/neurodx/rules.metta"))
        );
        assert_eq!(config.proof_depth, 5);
        assert_eq!(config.max_proofs, 10);
        assert_eq!(config.llm.timeout_secs, 15);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config(&[("GEMINI_API_KEY", "  "), ("NEURODX_PROOF_DEPTH", "")]).unwrap();
        assert_eq!(config.llm.gemini_api_key, None);
        assert_eq!(config.proof_depth, DEFAULT_PROOF_DEPTH);
    }

    #[test]
    fn rejects_bad_values() {
        for (var, value) in [
            ("NEURODX_LLM_PROVIDER", "openai"),
            ("NEURODX_BIND", "not-an-address"),
            ("NEURODX_PROOF_DEPTH", "-1"),
            ("NEURODX_MAX_PROOFS", "0"),
            ("NEURODX_LLM_TIMEOUT_SECS", "soon"),
        ] {
            match config(&[(var, value)]) {
                Err(ConfigError::Invalid { var: got, .. }) => assert_eq!(got, var),
                Ok(_) => panic!("{var}={value} accepted"),
            }
        }
    }

    #[test]
    fn missing_key_builds_unconfigured_client() {
        let client = config(&[]).unwrap().llm.build_client().unwrap();
        assert_eq!(client.name(), "unconfigured");
    }

    #[test]
    fn provider_selects_client() {
        let gemini = config(&[("GEMINI_API_KEY", "k")]).unwrap().llm.build_client().unwrap();
        assert_eq!(gemini.name(), "gemini");
        let ollama = config(&[("NEURODX_LLM_PROVIDER", "ollama")])
            .unwrap()
            .llm
            .build_client()
            .unwrap();
        assert_eq!(ollama.name(), "ollama");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
