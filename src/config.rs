use axum::http::HeaderValue;
use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    /// HS256 key used to verify member tokens
    pub jwt_secret: String,
    pub debug_key: String,
    pub bind_addr: String,
    pub cors_origin: HeaderValue,
    pub run_migrations: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| "JWT_SECRET must be set".to_string())?;
        if jwt_secret.len() < 16 {
            return Err("JWT_SECRET must be at least 16 characters".to_string());
        }

        let debug_key = lookup("DEBUG_KEY").ok_or_else(|| "DEBUG_KEY must be set".to_string())?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let cors_origin = lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let cors_origin = HeaderValue::from_str(&cors_origin)
            .map_err(|_| format!("Invalid CORS_ORIGIN value: {}", cors_origin))?;

        let run_migrations = match lookup("RUN_MIGRATIONS") {
            None => true,
            Some(value) => parse_bool(&value).ok_or_else(|| format!("Invalid RUN_MIGRATIONS value: {}", value))?,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            debug_key,
            bind_addr,
            cors_origin,
            run_migrations,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
