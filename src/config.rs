use serde::Deserialize;

/// Token lifetimes, in hours.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub activation_ttl_hours: i64,
    pub authentication_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub env: String,
    pub tokens: TokenConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let tokens = TokenConfig {
            activation_ttl_hours: std::env::var("ACTIVATION_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(72),
            authentication_ttl_hours: std::env::var("AUTH_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        Ok(Self {
            database_url,
            env,
            tokens,
        })
    }
}
