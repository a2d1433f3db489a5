use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::workflows::analysis::input::{DEFAULT_CHARACTER_LIMIT, DEFAULT_WORD_LIMIT};
use crate::workflows::analysis::{
    AnalysisSettings, ExtractionMode, ResponseFormat, TruncationPolicy,
};

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_MODEL_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_RESEND_URL: &str = "https://api.resend.com";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub http: HttpConfig,
    pub model: ModelConfig,
    pub analysis: AnalysisConfig,
    pub delivery: DeliveryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            http: HttpConfig::from_env()?,
            model: ModelConfig::from_env()?,
            analysis: AnalysisConfig::from_env()?,
            delivery: DeliveryConfig::from_env(),
        })
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            truncation: self.analysis.truncation.clone(),
            response_format: self.model.response_format,
            extraction_mode: self.analysis.extraction_mode,
        }
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Outbound HTTP client settings shared by the model, article and mail clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl HttpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secs = positive("COPYCHECK_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        Ok(Self {
            timeout: Duration::from_secs(secs),
        })
    }

    /// Client with the configured whole-request timeout.
    pub fn client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(self.timeout).build()
    }
}

/// Chat completion parameters. The key is only required once a client is built.
#[derive(Clone)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub seed: u64,
    pub response_format: ResponseFormat,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_MODEL_URL.to_string(),
            temperature: 0.1,
            top_p: 1.0,
            max_tokens: 2048,
            seed: 42,
            response_format: ResponseFormat::Text,
        }
    }
}

impl ModelConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let response_format = match env_value("COPYCHECK_RESPONSE_FORMAT") {
            Some(value) => ResponseFormat::parse(&value).ok_or(ConfigError::InvalidChoice {
                key: "COPYCHECK_RESPONSE_FORMAT",
                value,
            })?,
            None => defaults.response_format,
        };

        Ok(Self {
            api_key: env_value("GROQ_API_KEY"),
            model: env_value("COPYCHECK_MODEL").unwrap_or(defaults.model),
            endpoint: env_value("COPYCHECK_MODEL_URL").unwrap_or(defaults.endpoint),
            temperature: number("COPYCHECK_TEMPERATURE", defaults.temperature)?,
            top_p: number("COPYCHECK_TOP_P", defaults.top_p)?,
            max_tokens: number("COPYCHECK_MAX_TOKENS", defaults.max_tokens)?,
            seed: number("COPYCHECK_SEED", defaults.seed)?,
            response_format,
        })
    }

    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        self.api_key
            .clone()
            .ok_or(ConfigError::MissingSecret("GROQ_API_KEY"))
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .field("seed", &self.seed)
            .field("response_format", &self.response_format)
            .finish()
    }
}

/// Input preparation and reply parsing.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub truncation: TruncationPolicy,
    pub extraction_mode: ExtractionMode,
}

impl AnalysisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let strategy = env_value("COPYCHECK_TRUNCATION").unwrap_or_else(|| "chars".to_string());
        let truncation = match strategy.trim().to_ascii_lowercase().as_str() {
            "chars" | "characters" => TruncationPolicy::characters(positive(
                "COPYCHECK_TRUNCATION_LIMIT",
                DEFAULT_CHARACTER_LIMIT,
            )?),
            "words" => TruncationPolicy::words(positive(
                "COPYCHECK_TRUNCATION_LIMIT",
                DEFAULT_WORD_LIMIT,
            )?),
            _ => {
                return Err(ConfigError::InvalidChoice {
                    key: "COPYCHECK_TRUNCATION",
                    value: strategy,
                })
            }
        };

        let extraction_mode = match env_value("COPYCHECK_EXTRACTION") {
            Some(value) => ExtractionMode::parse(&value).ok_or(ConfigError::InvalidChoice {
                key: "COPYCHECK_EXTRACTION",
                value,
            })?,
            None => ExtractionMode::default(),
        };

        Ok(Self {
            truncation,
            extraction_mode,
        })
    }
}

/// Mail provider and subscriber log settings. Every field is optional until delivery is wired.
#[derive(Clone)]
pub struct DeliveryConfig {
    pub api_key: Option<String>,
    pub sender: Option<String>,
    pub audience_id: Option<String>,
    pub api_url: String,
    pub subscriber_log: Option<PathBuf>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            sender: None,
            audience_id: None,
            api_url: DEFAULT_RESEND_URL.to_string(),
            subscriber_log: None,
        }
    }
}

impl DeliveryConfig {
    fn from_env() -> Self {
        Self {
            api_key: env_value("RESEND_API_KEY"),
            sender: env_value("RESEND_SENDER_EMAIL"),
            audience_id: env_value("RESEND_AUDIENCE_ID"),
            api_url: env_value("RESEND_API_URL").unwrap_or_else(|| DEFAULT_RESEND_URL.to_string()),
            subscriber_log: env_value("COPYCHECK_SUBSCRIBER_LOG").map(PathBuf::from),
        }
    }

    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        self.api_key
            .clone()
            .ok_or(ConfigError::MissingSecret("RESEND_API_KEY"))
    }

    pub fn require_sender(&self) -> Result<String, ConfigError> {
        self.sender
            .clone()
            .ok_or(ConfigError::MissingSecret("RESEND_SENDER_EMAIL"))
    }
}

impl fmt::Debug for DeliveryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("sender", &self.sender)
            .field("audience_id", &redacted(&self.audience_id))
            .field("api_url", &self.api_url)
            .field("subscriber_log", &self.subscriber_log)
            .finish()
    }
}

fn redacted(value: &Option<String>) -> &'static str {
    match value {
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

/// Non-empty, trimmed environment value.
fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn number<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env_value(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber { key }),
        None => Ok(default),
    }
}

/// Like `number`, but zero is rejected.
fn positive<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let value = number(key, default)?;
    if value == T::default() {
        return Err(ConfigError::InvalidNumber { key });
    }
    Ok(value)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidChoice { key: &'static str, value: String },
    MissingSecret(&'static str),
    HttpClient { source: reqwest::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => write!(f, "{key} has an invalid numeric value"),
            ConfigError::InvalidChoice { key, value } => {
                write!(f, "{key} has unsupported value '{value}'")
            }
            ConfigError::MissingSecret(key) => write!(f, "{key} is not set"),
            ConfigError::HttpClient { .. } => write!(f, "HTTP client could not be built"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::HttpClient { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const KEYS: [&str; 21] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "GROQ_API_KEY",
        "COPYCHECK_MODEL",
        "COPYCHECK_MODEL_URL",
        "COPYCHECK_TEMPERATURE",
        "COPYCHECK_TOP_P",
        "COPYCHECK_MAX_TOKENS",
        "COPYCHECK_SEED",
        "COPYCHECK_RESPONSE_FORMAT",
        "COPYCHECK_TRUNCATION",
        "COPYCHECK_TRUNCATION_LIMIT",
        "COPYCHECK_EXTRACTION",
        "RESEND_API_KEY",
        "RESEND_SENDER_EMAIL",
        "RESEND_AUDIENCE_ID",
        "RESEND_API_URL",
        "COPYCHECK_SUBSCRIBER_LOG",
        "COPYCHECK_HTTP_TIMEOUT_SECS",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.model.model, DEFAULT_MODEL);
        assert_eq!(config.model.max_tokens, 2048);
        assert_eq!(config.model.seed, 42);
        assert_eq!(config.model.response_format, ResponseFormat::Text);
        assert_eq!(config.analysis.truncation, TruncationPolicy::default());
        assert_eq!(config.analysis.extraction_mode, ExtractionMode::Auto);
        assert_eq!(config.delivery.api_url, DEFAULT_RESEND_URL);
        assert!(config.delivery.subscriber_log.is_none());
        assert_eq!(
            config.http.timeout,
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_strategy_choices() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("COPYCHECK_RESPONSE_FORMAT", "json");
        env::set_var("COPYCHECK_TRUNCATION", "words");
        env::set_var("COPYCHECK_EXTRACTION", "free_text");
        let config = AppConfig::load().expect("config loads");
        let settings = config.analysis_settings();
        assert_eq!(settings.response_format, ResponseFormat::Json);
        assert_eq!(settings.truncation, TruncationPolicy::words(DEFAULT_WORD_LIMIT));
        assert_eq!(settings.extraction_mode, ExtractionMode::FreeTextOnly);
        reset_env();
    }

    #[test]
    fn rejects_bad_numbers_and_choices() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("COPYCHECK_MAX_TOKENS", "lots");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "COPYCHECK_MAX_TOKENS"
            })
        ));

        reset_env();
        env::set_var("COPYCHECK_TRUNCATION_LIMIT", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "COPYCHECK_TRUNCATION_LIMIT"
            })
        ));

        env::set_var("COPYCHECK_TRUNCATION", "words");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "COPYCHECK_TRUNCATION_LIMIT"
            })
        ));

        reset_env();
        env::set_var("COPYCHECK_HTTP_TIMEOUT_SECS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "COPYCHECK_HTTP_TIMEOUT_SECS"
            })
        ));

        reset_env();
        env::set_var("COPYCHECK_HTTP_TIMEOUT_SECS", "5");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.http.timeout, Duration::from_secs(5));

        reset_env();
        env::set_var("COPYCHECK_TRUNCATION", "sentences");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidChoice {
                key: "COPYCHECK_TRUNCATION",
                ..
            })
        ));
        reset_env();
    }

    #[test]
    fn secrets_are_redacted_and_required_lazily() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("loads without secrets");
        assert!(matches!(
            config.model.require_api_key(),
            Err(ConfigError::MissingSecret("GROQ_API_KEY"))
        ));

        env::set_var("GROQ_API_KEY", "gsk_live_secret");
        env::set_var("RESEND_API_KEY", "re_live_secret");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.model.require_api_key().expect("key set"), "gsk_live_secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("gsk_live_secret"));
        assert!(!rendered.contains("re_live_secret"));
        assert!(rendered.contains("<redacted>"));
        reset_env();
    }
}
