// src/config/mod.rs
// All runtime tunables come from the environment, with defaults that work
// for local development.

use once_cell::sync::Lazy;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct TeamchatConfig {
    // ── Gemini upstream
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub model: String,
    pub fallback_model: String,
    pub upstream_timeout: u64,

    // ── Team storage
    pub team_store: String,
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Server
    pub host: String,
    pub port: u16,
    pub cors_origin: String,

    // ── Logging
    pub log_level: String,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            // Trim whitespace and strip inline comments before parsing
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {key} = '{val}' (parse failed, using default)");
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl TeamchatConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }

        Self {
            gemini_api_key: env_var_or("GEMINI_API_KEY", String::new()),
            gemini_base_url: env_var_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com".to_string(),
            ),
            model: env_var_or("GEMINI_MODEL", "gemini-2.5-flash".to_string()),
            fallback_model: env_var_or("GEMINI_FALLBACK_MODEL", "gemini-1.5-flash".to_string()),
            upstream_timeout: env_var_or("GEMINI_TIMEOUT", 60),
            team_store: env_var_or("TEAMCHAT_TEAM_STORE", "memory".to_string()),
            database_url: env_var_or("DATABASE_URL", "sqlite:./teamchat.db".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 10),
            host: env_var_or("TEAMCHAT_HOST", "0.0.0.0".to_string()),
            port: env_var_or("TEAMCHAT_PORT", 8080),
            cors_origin: env_var_or("TEAMCHAT_CORS_ORIGIN", "http://localhost:3000".to_string()),
            log_level: env_var_or("TEAMCHAT_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True once an upstream API key has been configured
    pub fn has_api_key(&self) -> bool {
        !self.gemini_api_key.is_empty()
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<TeamchatConfig> = Lazy::new(TeamchatConfig::from_env);
