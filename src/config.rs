// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Default Gemini API base URL.
pub const DEFAULT_AI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_AI_MODEL: &str = "gemini-1.5-flash";

/// Which persistence backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Cloud Firestore (or the emulator when `FIRESTORE_EMULATOR_HOST` is set).
    Firestore,
    /// In-process store. Data is lost on restart.
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORAGE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub storage_backend: StorageBackend,

    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    // --- AI workout generation ---
    pub ai_api_url: String,
    /// API key; generation is disabled when unset.
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_timeout_secs: u64,
    pub ai_rate_limit_per_minute: u32,
    pub ai_rate_limit_per_day: u32,
}

impl Config {
    /// Config for tests: in-memory storage and no AI key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            storage_backend: StorageBackend::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            ai_api_url: DEFAULT_AI_API_URL.to_string(),
            ai_api_key: None,
            ai_model: DEFAULT_AI_MODEL.to_string(),
            ai_timeout_secs: 30,
            ai_rate_limit_per_minute: 15,
            ai_rate_limit_per_day: 1500,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_or("PORT", 8080)?,
            storage_backend: env::var("STORAGE_BACKEND")
                .map(|v| v.parse::<StorageBackend>())
                .unwrap_or(Ok(StorageBackend::Firestore))?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),

            ai_api_url: env::var("AI_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_AI_API_URL.to_string()),
            ai_api_key: env::var("AI_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            ai_model: env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_AI_MODEL.to_string()),
            ai_timeout_secs: parse_or("AI_TIMEOUT_SECS", 30)?,
            ai_rate_limit_per_minute: parse_or("AI_RATE_LIMIT_PER_MINUTE", 15)?,
            ai_rate_limit_per_day: parse_or("AI_RATE_LIMIT_PER_DAY", 1500)?,
        })
    }
}

/// Parse an optional numeric variable, rejecting values that do not parse.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => {
            let parsed = raw.trim().parse::<T>();
            parsed.map_err(|_| ConfigError::Invalid(name, raw))
        }
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
