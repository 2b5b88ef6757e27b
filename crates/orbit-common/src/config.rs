//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > config.toml > defaults

use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Get the global application configuration.
///
/// # Panics
/// Panics if config has not been initialized via [`init`].
pub fn get() -> &'static AppConfig {
    CONFIG.get().expect("Config not initialized. Call orbit_common::config::init() first.")
}

/// Initialize the global configuration from environment.
///
/// Should be called once at application startup, before any other code accesses config.
pub fn init() -> Result<&'static AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let cfg = config::Config::builder()
        // Defaults
        .set_default("database.max_connections", 20)?
        .set_default("database.min_connections", 5)?
        .set_default("provider.base_url", "http://localhost:8065")?
        .set_default("provider.token", "")?
        .set_default("provider.timeout_secs", 10)?
        // Optional config file
        .add_source(config::File::with_name("config").required(false))
        // Environment variables (ORBIT_DATABASE__URL, ORBIT_PROVIDER__BASE_URL, etc.)
        .add_source(
            config::Environment::with_prefix("ORBIT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    Ok(CONFIG.get_or_init(|| app_config))
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Base URL of the external chat provider (e.g. "https://chat.example.com").
    pub base_url: String,
    /// Bearer token used to authenticate against the provider API.
    pub token: String,
    /// Per-request timeout for provider calls. A timed-out call is treated
    /// the same as a failed call: logged, local state untouched.
    pub timeout_secs: u64,
}
