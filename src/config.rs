use std::env;

use thiserror::Error;

/// Page size of the admin order listing unless `ORDERS_PAGE_SIZE` overrides it.
pub const DEFAULT_ORDERS_PAGE_SIZE: i64 = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration, built once in `main` and handed to `build_server`.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub orders_page_size: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("orders_page_size", &self.orders_page_size)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 8080,
        };

        let orders_page_size = match lookup("ORDERS_PAGE_SIZE") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "ORDERS_PAGE_SIZE",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_ORDERS_PAGE_SIZE,
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            orders_page_size,
        })
    }
}
