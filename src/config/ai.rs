// src/config/ai.rs
use serde::Deserialize;
use std::env;

use crate::error::DigestError;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL: &str = "DIGEST_OPENAI_MODEL";

fn default_model() -> String {
    env::var(ENV_OPENAI_MODEL).unwrap_or_else(|_| "gpt-4.1-mini".to_string())
}

/// Brief generator settings (`[generator]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorCfg {
    pub enabled: bool,
    /// Only "openai" is wired; anything else behaves as disabled.
    pub provider: String,
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY at run time.
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".to_string(),
            model: default_model(),
            api_key: "ENV".to_string(),
            timeout_secs: 60,
        }
    }
}

impl GeneratorCfg {
    /// Resolve the credential. A missing key is not an error for the run;
    /// callers turn it into stub briefs.
    pub fn resolve_api_key(&self) -> Result<String, DigestError> {
        let raw = if self.api_key.trim().eq_ignore_ascii_case("env") {
            env::var(ENV_OPENAI_API_KEY).unwrap_or_default()
        } else {
            self.api_key.clone()
        };
        let key = raw.trim().to_string();
        if key.is_empty() {
            return Err(DigestError::CredentialMissing(format!(
                "{ENV_OPENAI_API_KEY} is not set."
            )));
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_key_resolution() {
        let cfg = GeneratorCfg::default();
        env::remove_var(ENV_OPENAI_API_KEY);
        let err = cfg.resolve_api_key().unwrap_err();
        assert!(matches!(err, DigestError::CredentialMissing(_)));

        env::set_var(ENV_OPENAI_API_KEY, "  sk-test  ");
        assert_eq!(cfg.resolve_api_key().unwrap(), "sk-test");
        env::remove_var(ENV_OPENAI_API_KEY);
    }

    #[test]
    fn literal_key_wins() {
        let cfg = GeneratorCfg {
            api_key: "sk-literal".into(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_api_key().unwrap(), "sk-literal");
    }
}
