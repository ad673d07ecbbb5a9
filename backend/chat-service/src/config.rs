use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    /// HS256 secret shared with the session provider that issues bearer tokens
    pub jwt_secret: String,
    pub db_max_connections: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, crate::error::AppError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, crate::error::AppError> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| crate::error::AppError::Config("DATABASE_URL missing".into()))?;
        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".into());
        let port = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| crate::error::AppError::Config("JWT_SECRET missing".into()))?;
        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(16);

        Ok(Self {
            database_url,
            redis_url,
            port,
            jwt_secret,
            db_max_connections,
        })
    }
}
