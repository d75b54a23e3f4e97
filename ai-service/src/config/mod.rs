use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Port the service listens on when `APP__PORT` is not set.
pub const DEFAULT_PORT: u16 = 8001;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Well-known model identifiers used when the provider's model listing fails.
const DEFAULT_FALLBACK_MODELS: &str = "gemini-pro,gemini-1.5-pro,gemini-1.5-flash";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct AiServiceConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Secret<String>,
    pub base_url: String,
    pub fallback_models: Vec<String>,
    /// Upper bound for a single provider call, including model listing.
    pub request_timeout_secs: u64,
}

impl AiServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load(DEFAULT_PORT)?;
        Self::load_from(common, |key| env::var(key).ok())
    }

    /// Build the service settings from `lookup` instead of the process
    /// environment.
    pub fn load_from<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";

        // GOOGLE_API_KEY is what the other micros services read.
        let api_key = ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
            .iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "GEMINI_API_KEY environment variable is required"
                ))
            })?;

        let request_timeout_secs = get_env(
            &lookup,
            "GEMINI_REQUEST_TIMEOUT_SECS",
            Some(&DEFAULT_REQUEST_TIMEOUT_SECS.to_string()),
            is_prod,
        )?
        .parse()
        .map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "GEMINI_REQUEST_TIMEOUT_SECS must be a whole number of seconds: {}",
                e
            ))
        })?;

        Ok(AiServiceConfig {
            common,
            gemini: GeminiSettings {
                api_key: Secret::new(api_key.trim().to_string()),
                base_url: get_env(
                    &lookup,
                    "GEMINI_API_BASE_URL",
                    Some(DEFAULT_GEMINI_BASE_URL),
                    is_prod,
                )?,
                fallback_models: parse_model_list(&get_env(
                    &lookup,
                    "GEMINI_FALLBACK_MODELS",
                    Some(DEFAULT_FALLBACK_MODELS),
                    is_prod,
                )?),
                request_timeout_secs,
            },
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
        })
    }
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn common() -> core_config::Config {
        core_config::Config {
            port: 0,
            log_level: "info".to_string(),
        }
    }

    fn load(vars: &[(&str, &str)]) -> Result<AiServiceConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AiServiceConfig::load_from(common(), |key| vars.get(key).cloned())
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let result = load(&[]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn blank_api_key_is_a_config_error() {
        let result = load(&[("GEMINI_API_KEY", "   ")]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn google_api_key_is_accepted() {
        let config = load(&[("GOOGLE_API_KEY", "from-google")]).unwrap();
        assert_eq!(config.gemini.api_key.expose_secret(), "from-google");
    }

    #[test]
    fn defaults_apply_outside_production() {
        let config = load(&[("GEMINI_API_KEY", "key")]).unwrap();
        assert_eq!(config.gemini.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(
            config.gemini.fallback_models,
            vec!["gemini-pro", "gemini-1.5-pro", "gemini-1.5-flash"]
        );
        assert_eq!(config.gemini.request_timeout_secs, 120);
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn production_requires_explicit_settings() {
        let result = load(&[("GEMINI_API_KEY", "key"), ("ENVIRONMENT", "prod")]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn fallback_models_are_trimmed_and_skip_blanks() {
        let config = load(&[
            ("GEMINI_API_KEY", "key"),
            ("GEMINI_FALLBACK_MODELS", " gemini-2.0-flash , ,gemini-pro"),
        ])
        .unwrap();
        assert_eq!(
            config.gemini.fallback_models,
            vec!["gemini-2.0-flash", "gemini-pro"]
        );
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let result = load(&[
            ("GEMINI_API_KEY", "key"),
            ("GEMINI_REQUEST_TIMEOUT_SECS", "soon"),
        ]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
