use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// `None` disables the background expiry sweep.
    pub expiry_sweep_interval: Option<Duration>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let optional = |key: &str| lookup(key).ok().filter(|value| !value.trim().is_empty());

        let database_url = lookup("DATABASE_URL")?;
        let jwt_secret = lookup("JWT_SECRET")?;

        let database_max_connections = match optional("DATABASE_MAX_CONNECTIONS") {
            Some(value) => parse(&value, "DATABASE_MAX_CONNECTIONS")?,
            None => 5,
        };

        let bind_addr = match optional("BIND_ADDR") {
            Some(value) => parse(&value, "BIND_ADDR")?,
            None => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };

        let sweep_secs: u64 = match optional("EXPIRY_SWEEP_INTERVAL_SECS") {
            Some(value) => parse(&value, "EXPIRY_SWEEP_INTERVAL_SECS")?,
            None => 60,
        };
        let expiry_sweep_interval = (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs));

        let log_level = optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            database_url,
            database_max_connections,
            bind_addr,
            jwt_secret,
            expiry_sweep_interval,
            log_level,
        })
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::validation(format!("{} has an invalid value: {}", key, value)))
}
