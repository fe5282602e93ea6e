use axum::http::HeaderValue;
use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Which upstream API the relay talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    #[serde(alias = "gpt")]
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }

    /// Environment variable holding the credential for this provider.
    pub fn credential_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_provider", rename = "relay_provider")]
    pub provider: Provider,
    #[serde(default)]
    pub gemini_api_key: Option<SecretString>,
    #[serde(default)]
    pub openai_api_key: Option<SecretString>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub upstream_timeout_ms: u64,
    #[serde(default = "default_allowed_origins")]
    pub cors_allowed_origins: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_provider() -> Provider {
    Provider::Gemini
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_allowed_origins() -> String {
    "*".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::load(Environment::default())
    }

    pub(crate) fn load(source: Environment) -> Result<Self, AppError> {
        let config = Config::builder().add_source(source).build()?;
        let relay: Self = config.try_deserialize()?;
        relay.validate()?;
        Ok(relay)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "UPSTREAM_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        if let Some(origin) = self
            .allowed_origins()
            .into_iter()
            .find(|o| o != "*" && HeaderValue::from_str(o).is_err())
        {
            return Err(ConfigError::Message(format!(
                "CORS_ALLOWED_ORIGINS contains an invalid origin: {origin:?}"
            )));
        }

        Ok(())
    }

    /// Credential for the selected provider. Blank values count as missing.
    pub fn api_key(&self) -> Option<&SecretString> {
        let key = match self.provider {
            Provider::Gemini => self.gemini_api_key.as_ref(),
            Provider::OpenAi => self.openai_api_key.as_ref(),
        };
        key.filter(|k| !k.expose_secret().trim().is_empty())
    }

    pub fn model(&self) -> &str {
        match self.provider {
            Provider::Gemini => &self.gemini_model,
            Provider::OpenAi => &self.openai_model,
        }
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<RelayConfig, AppError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RelayConfig::load(Environment::default().source(Some(map)))
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.provider, Provider::Gemini);
        assert_eq!(cfg.model(), "gemini-2.0-flash");
        assert!(cfg.api_key().is_none());
        assert_eq!(cfg.allowed_origins(), vec!["*".to_string()]);
    }

    #[test]
    fn reads_port_provider_and_key() {
        let cfg = load(&[
            ("PORT", "8088"),
            ("RELAY_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("GEMINI_API_KEY", "ignored"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8088);
        assert_eq!(cfg.provider, Provider::OpenAi);
        assert_eq!(cfg.model(), "gpt-4o-mini");
        assert_eq!(cfg.api_key().unwrap().expose_secret(), "sk-test");
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let cfg = load(&[("GEMINI_API_KEY", "   ")]).unwrap();
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn key_for_other_provider_does_not_count() {
        let cfg = load(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn origin_list_is_split_and_trimmed() {
        let cfg = load(&[(
            "CORS_ALLOWED_ORIGINS",
            "https://a.example, https://b.example ,",
        )])
        .unwrap();
        assert_eq!(
            cfg.allowed_origins(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(load(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = load(&[("UPSTREAM_TIMEOUT_MS", "0")]).unwrap_err();
        assert!(err.to_string().contains("UPSTREAM_TIMEOUT_MS"));
    }

    #[test]
    fn custom_timeout_is_kept() {
        let cfg = load(&[("UPSTREAM_TIMEOUT_MS", "2500")]).unwrap();
        assert_eq!(cfg.upstream_timeout_ms, 2_500);
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let err = load(&[("CORS_ALLOWED_ORIGINS", "https://bad\u{1}.example")]).unwrap_err();
        assert!(err.to_string().contains("CORS_ALLOWED_ORIGINS"));
    }

    #[test]
    fn wildcard_mixed_with_origins_is_accepted() {
        let cfg = load(&[("CORS_ALLOWED_ORIGINS", "*,https://app.example")]).unwrap();
        assert_eq!(cfg.allowed_origins().len(), 2);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(load(&[("RELAY_PROVIDER", "claude")]).is_err());
    }
}
