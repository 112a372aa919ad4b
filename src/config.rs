use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::BenchError;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PROMPT: &str = "Reply briefly: the service is available.";
pub const DEFAULT_DOCUMENT_PATH: &str = "README.md";

/// Resolved settings for one benchmark run. Never mutated once built.
#[derive(Clone)]
pub struct Config {
    pub api_url: String,
    pub model: String,
    pub prompt: String,
    pub api_key: String,
    pub request_count: u32,
    pub request_timeout: Duration,
    /// Zero means unlimited.
    pub max_runtime: Duration,
    pub max_tokens: u32,
    pub temperature: f64,
    pub request_pause: Duration,
    pub document_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            api_key: String::new(),
            request_count: 5,
            request_timeout: Duration::from_secs(120),
            max_runtime: Duration::ZERO,
            max_tokens: 128,
            temperature: 0.1,
            request_pause: Duration::ZERO,
            document_path: PathBuf::from(DEFAULT_DOCUMENT_PATH),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("prompt", &self.prompt)
            .field("api_key", &"[REDACTED]")
            .field("request_count", &self.request_count)
            .field("request_timeout", &self.request_timeout)
            .field("max_runtime", &self.max_runtime)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_pause", &self.request_pause)
            .field("document_path", &self.document_path)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, BenchError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Config::from_env`], but keeps whatever did parse.
    pub fn resolve_env() -> (Self, Option<BenchError>) {
        Self::resolve(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset or empty keys fall
    /// back to defaults; values that fail to parse are configuration errors.
    /// Range checks are left to [`Config::validate`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BenchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match Self::resolve(lookup) {
            (config, None) => Ok(config),
            (_, Some(e)) => Err(e),
        }
    }

    /// Resolve every key independently. A value that fails to parse keeps its
    /// default and the first such error is returned next to the partial
    /// config, so a failed run can still be reported against the settings
    /// that were understood.
    pub fn resolve<F>(lookup: F) -> (Self, Option<BenchError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        let mut first_error = None;

        let config = Self {
            api_url: get("OPENAI_API_URL").unwrap_or(defaults.api_url),
            model: get("OPENAI_MODEL").unwrap_or(defaults.model),
            prompt: get("OPENAI_PROMPT").unwrap_or(defaults.prompt),
            api_key: get("OPENAI_API_KEY").unwrap_or_default(),
            request_count: settle(
                parse_or("OPENAI_REQUEST_COUNT", get("OPENAI_REQUEST_COUNT"), defaults.request_count),
                defaults.request_count,
                &mut first_error,
            ),
            request_timeout: settle(
                parse_seconds(
                    "OPENAI_REQUEST_TIMEOUT_SECONDS",
                    get("OPENAI_REQUEST_TIMEOUT_SECONDS"),
                    defaults.request_timeout,
                ),
                defaults.request_timeout,
                &mut first_error,
            ),
            max_runtime: settle(
                parse_seconds(
                    "OPENAI_MAX_RUNTIME_SECONDS",
                    get("OPENAI_MAX_RUNTIME_SECONDS"),
                    defaults.max_runtime,
                ),
                defaults.max_runtime,
                &mut first_error,
            ),
            max_tokens: settle(
                parse_or("OPENAI_MAX_TOKENS", get("OPENAI_MAX_TOKENS"), defaults.max_tokens),
                defaults.max_tokens,
                &mut first_error,
            ),
            temperature: settle(
                parse_or("OPENAI_TEMPERATURE", get("OPENAI_TEMPERATURE"), defaults.temperature),
                defaults.temperature,
                &mut first_error,
            ),
            request_pause: settle(
                parse_seconds(
                    "OPENAI_REQUEST_PAUSE_SECONDS",
                    get("OPENAI_REQUEST_PAUSE_SECONDS"),
                    defaults.request_pause,
                ),
                defaults.request_pause,
                &mut first_error,
            ),
            document_path: get("OPENAI_README_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.document_path),
        };
        (config, first_error)
    }

    /// Reject configurations that must never reach the request loop.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.api_key.trim().is_empty() {
            return Err(BenchError::Config(
                "missing required environment variable: OPENAI_API_KEY".to_string(),
            ));
        }
        if self.api_url.trim().is_empty() {
            return Err(BenchError::Config("OPENAI_API_URL must not be empty".to_string()));
        }
        if self.request_count == 0 {
            return Err(BenchError::Config("OPENAI_REQUEST_COUNT must be > 0".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(BenchError::Config(
                "OPENAI_REQUEST_TIMEOUT_SECONDS must be > 0".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(BenchError::Config("OPENAI_MAX_TOKENS must be > 0".to_string()));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(BenchError::Config(
                "OPENAI_TEMPERATURE must be a finite number >= 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Total runtime budget, or None when unlimited.
    pub fn runtime_budget(&self) -> Option<Duration> {
        (!self.max_runtime.is_zero()).then_some(self.max_runtime)
    }
}

/// Unwrap a parsed value, falling back to `default` and remembering the
/// first failure.
fn settle<T>(parsed: Result<T, BenchError>, default: T, first_error: &mut Option<BenchError>) -> T {
    match parsed {
        Ok(value) => value,
        Err(e) => {
            first_error.get_or_insert(e);
            default
        }
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, BenchError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| BenchError::Config(format!("{name} has an invalid value: {value}"))),
    }
}

/// Seconds may be fractional; negative and non-finite values are rejected.
fn parse_seconds(name: &str, raw: Option<String>, default: Duration) -> Result<Duration, BenchError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| BenchError::Config(format!("{name} must be a number, got: {value}")))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| BenchError::Config(format!("{name} must be >= 0, got: {value}")))
}
