use anyhow::Context;
use serde::Deserialize;

/// Tokens never live longer than a year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub cors_origins: Vec<String>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.into());

        let database_url = match get("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}?sslmode={}",
                get_or("DB_USER", "postgres"),
                get_or("DB_PASSWORD", ""),
                get_or("DB_HOST", "localhost"),
                get_or("DB_PORT", "5432"),
                get_or("DB_NAME", "inkwell"),
                get_or("DB_SSLMODE", "disable"),
            ),
        };

        let jwt = JwtConfig {
            secret: get("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: get_or("JWT_ISSUER", "inkwell"),
            audience: get_or("JWT_AUDIENCE", "inkwell-users"),
            ttl_minutes: get("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .map(|v| v.min(MAX_TTL_MINUTES))
                .unwrap_or(60 * 24),
        };

        let cookie = CookieConfig {
            name: get_or("AUTH_COOKIE_NAME", "jwt"),
            secure: get("APP_ENV").as_deref() == Some("production"),
        };

        let cors_origins = get_or("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let port = match get("APP_PORT").or_else(|| get("PORT")) {
            Some(p) => p.parse::<u16>().with_context(|| format!("invalid port {p}"))?,
            None => 8080,
        };

        Ok(Self {
            database_url,
            jwt,
            cookie,
            cors_origins,
            host: get_or("APP_HOST", "0.0.0.0"),
            port,
        })
    }
}
