//! Runtime configuration read once from the environment.
//!
//! The binary loads `.env` first, then calls [`GeneratorConfig::from_env`].
//! The resulting struct is passed explicitly to the generator factory and the
//! diff collector; nothing else in the crate reads the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Primary credential variable.
pub const API_KEY_ENV_VAR: &str = "API_KEY";
/// Credential variable name accepted for compatibility.
pub const FALLBACK_API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

const MODEL_ENV_VAR: &str = "AUTOCOMMIT_MODEL";
const API_BASE_ENV_VAR: &str = "AUTOCOMMIT_API_BASE";
const TIMEOUT_ENV_VAR: &str = "AUTOCOMMIT_TIMEOUT";
const MAX_ATTEMPTS_ENV_VAR: &str = "AUTOCOMMIT_MAX_ATTEMPTS";
const PROMPT_FILE_ENV_VAR: &str = "AUTOCOMMIT_PROMPT_FILE";
const MAX_DIFF_CHARS_ENV_VAR: &str = "AUTOCOMMIT_MAX_DIFF_CHARS";
const FOCUS_PATHS_ENV_VAR: &str = "AUTOCOMMIT_FOCUS_PATHS";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_MAX_DIFF_CHARS: usize = 20_000;

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            top_k: 1,
            max_output_tokens: 5000,
        }
    }
}

/// Everything the generator and collector need, sourced once at startup.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub sampling: SamplingConfig,
    pub prompt_file: Option<PathBuf>,
    pub max_diff_chars: usize,
    pub focus_paths: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            sampling: SamplingConfig::default(),
            prompt_file: None,
            max_diff_chars: DEFAULT_MAX_DIFF_CHARS,
            focus_paths: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Build the configuration from process environment variables.
    ///
    /// Empty values are treated as unset. Invalid numbers log a warning and
    /// fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = non_empty_var(API_KEY_ENV_VAR).or_else(|| non_empty_var(FALLBACK_API_KEY_ENV_VAR));

        let timeout_secs = parse_var(TIMEOUT_ENV_VAR, DEFAULT_TIMEOUT_SECS);
        let max_attempts = parse_var(MAX_ATTEMPTS_ENV_VAR, DEFAULT_MAX_ATTEMPTS).max(1);

        let focus_paths = non_empty_var(FOCUS_PATHS_ENV_VAR)
            .map(|v| split_list(&v))
            .unwrap_or_default();

        Self {
            api_key,
            model: non_empty_var(MODEL_ENV_VAR).unwrap_or(defaults.model),
            api_base: non_empty_var(API_BASE_ENV_VAR).unwrap_or(defaults.api_base),
            timeout: Duration::from_secs(timeout_secs),
            max_attempts,
            sampling: defaults.sampling,
            prompt_file: non_empty_var(PROMPT_FILE_ENV_VAR).map(PathBuf::from),
            max_diff_chars: parse_var(MAX_DIFF_CHARS_ENV_VAR, DEFAULT_MAX_DIFF_CHARS),
            focus_paths,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match non_empty_var(name) {
        Some(v) => match v.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Invalid {} value '{}', using default {}", name, v, default);
                default
            }
        },
        None => default,
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
