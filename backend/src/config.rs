use std::{env, path::PathBuf, time::Duration};

const DEFAULT_PORT: &str = "3000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_SITE_DIR: &str = "./site";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_MAX_TOKENS: u32 = 2000;
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Listener and static file settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: String,
    pub site_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            port: env_or("PORT", DEFAULT_PORT),
            site_dir: PathBuf::from(env_or("SITE_DIR", DEFAULT_SITE_DIR)),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Upstream chat-completion settings for `/api/translate`.
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// `None` keeps the server up but fails every translation request.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub proxy_url: Option<String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            proxy_url: None,
        }
    }
}

impl TranslatorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: non_empty_env("OPENAI_API_KEY"),
            base_url: non_empty_env("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: non_empty_env("TRANSLATE_MODEL").unwrap_or(defaults.model),
            temperature: parse_env("TRANSLATE_TEMPERATURE").unwrap_or(defaults.temperature),
            max_tokens: parse_env("TRANSLATE_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            timeout: parse_env::<u64>("TRANSLATE_HTTP_TIMEOUT_SECONDS")
                .map(|seconds| Duration::from_secs(seconds.max(3)))
                .unwrap_or(defaults.timeout),
            proxy_url: non_empty_env("TRANSLATE_PROXY_URL"),
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn env_or(name: &str, default: &str) -> String {
    non_empty_env(name).unwrap_or_else(|| default.to_string())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = non_empty_env(name)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring invalid {name}={raw}");
            None
        },
    }
}
