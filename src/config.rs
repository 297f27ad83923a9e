use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

use crate::{
    constants::{DEFAULT_MAX_CONNECTIONS, DEFAULT_PORT, DEFAULT_TOKEN_HOURS},
    error::Error,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_lifetime_hours: i64,
    pub max_connections: u32,
}

impl Config {
    /// Reads the environment, after merging in a `.env` file when one exists.
    pub fn load() -> Result<Self, Error> {
        if let Err(e) = dotenvy::dotenv() {
            info!("No .env file loaded ({e})");
        }

        Ok(Self {
            port: try_load("FOODGRAM_PORT", DEFAULT_PORT)?,
            database_url: require("DATABASE_URL")?,
            jwt_secret: require("JWT_SECRET")?,
            token_lifetime_hours: try_load("FOODGRAM_TOKEN_HOURS", DEFAULT_TOKEN_HOURS)?,
            max_connections: try_load("FOODGRAM_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
        })
    }
}

fn require(key: &str) -> Result<String, Error> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found");
        Error::Config(format!("{key} must be set"))
    })
}

fn try_load<T>(key: &str, default: T) -> Result<T, Error>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => parse_value(key, &value),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        Error::Config(format!("Invalid {key} value '{value}': {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_parsed() {
        assert_eq!(parse_value::<u16>("FOODGRAM_PORT", " 8080 ").unwrap(), 8080);
        assert!(matches!(
            parse_value::<u16>("FOODGRAM_PORT", "eighty"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let value: i64 = try_load("FOODGRAM_SURELY_UNSET_VARIABLE", 24).unwrap();
        assert_eq!(value, 24);
    }
}
