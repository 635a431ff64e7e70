use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

/// Which identity authority turns a bearer credential into a subject id.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    /// Remote `accounts:lookup` round trip per request.
    IdentityToolkit,
    /// Local HS256 verification.
    Jwt,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub strategy: IdentityStrategy,
    pub identity_url: String,
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Candidate models, most preferred first.
    pub models: Vec<String>,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub list_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitSettings,
    pub generation: GenerationConfig,
    pub cors: CorsConfig,
    pub cache: CacheConfig,
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
    environment: &str,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("environment", environment)?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("auth.strategy", "identity_toolkit")?
        .set_default("auth.identity_url", "https://identitytoolkit.googleapis.com")?
        .set_default("rate_limit.max_requests", 5)?
        .set_default("rate_limit.window_secs", 60)?
        .set_default("generation.base_url", "https://generativelanguage.googleapis.com")?
        .set_default(
            "generation.models",
            vec!["gemini-2.5-flash", "gemini-1.5-flash", "gemini-pro"],
        )?
        .set_default("generation.max_output_tokens", 4096)?
        .set_default("generation.temperature", 0.9)?
        .set_default("generation.top_p", 0.95)?
        .set_default("generation.top_k", 40)?
        .set_default(
            "cors.allowed_origins",
            vec![
                "http://localhost:4200",
                "https://angular-firebase-8762d.web.app",
                "https://angular-firebase-8762d.firebaseapp.com",
            ],
        )?
        .set_default("cache.ttl_secs", 60)?
        .set_default("cache.list_limit", 10)
}

fn environment_source() -> Environment {
    Environment::with_prefix("app")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("generation.models")
        .with_list_parse_key("cors.allowed_origins")
        .try_parsing(true)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = with_defaults(Config::builder(), "development")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_GENERATION__API_KEY=...` would set `Settings.generation.api_key`
            .add_source(environment_source())
            .build()?;

        s.try_deserialize()
    }

    /// Defaults only, with a JWT identity strategy and a dummy generation key.
    /// Ignores config files and the environment so tests stay deterministic.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        with_defaults(Config::builder(), "test")?
            .set_override("auth.strategy", "jwt")?
            .set_override("auth.jwt_secret", "test_secret")?
            .set_override("generation.api_key", "test-generation-key")?
            .build()?
            .try_deserialize()
    }
}
