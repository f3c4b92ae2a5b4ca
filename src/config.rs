use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Allowed CORS origin; None means any origin (development default).
    pub cors_origin: Option<String>,
    /// Upper bound for a single store call before it fails as unavailable.
    pub store_timeout_ms: u64,
    pub db_pool_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, crate::error::AppError> {
        dotenv().ok();
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| crate::error::AppError::Config("DATABASE_URL missing".into()))?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| crate::error::AppError::Config("JWT_SECRET missing".into()))?;
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty());
        let store_timeout_ms = env::var("STORE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);
        let db_pool_size = env::var("DB_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(16);

        Ok(Self {
            database_url,
            port,
            jwt_secret,
            cors_origin,
            store_timeout_ms,
            db_pool_size,
        })
    }
}
