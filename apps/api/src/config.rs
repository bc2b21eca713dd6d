use anyhow::{Context, Result};

use crate::access::SessionCookies;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_bucket: String,
    pub s3_access_key_id: String,
    pub s3_secret_access_key: String,
    /// Base URL under which stored objects are publicly served.
    pub storage_public_url: String,
    pub cookies: SessionCookies,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let supabase_url = require_env("SUPABASE_URL")?;
        let storage_public_url = optional_env("STORAGE_PUBLIC_URL").unwrap_or_else(|| {
            format!(
                "{}/storage/v1/object/public",
                supabase_url.trim_end_matches('/')
            )
        });
        let defaults = SessionCookies::default();

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            supabase_url,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            s3_bucket: require_env("S3_BUCKET")?,
            s3_access_key_id: require_env("S3_ACCESS_KEY_ID")?,
            s3_secret_access_key: require_env("S3_SECRET_ACCESS_KEY")?,
            storage_public_url,
            cookies: SessionCookies {
                access_name: optional_env("ACCESS_COOKIE_NAME").unwrap_or(defaults.access_name),
                refresh_name: optional_env("REFRESH_COOKIE_NAME")
                    .unwrap_or(defaults.refresh_name),
                secure: match optional_env("COOKIE_SECURE") {
                    Some(raw) => parse_bool(&raw)
                        .with_context(|| format!("COOKIE_SECURE must be a boolean, got '{raw}'"))?,
                    None => defaults.secure,
                },
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
