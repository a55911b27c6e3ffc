use crate::domain::Address;
use std::collections::HashMap;
use thiserror::Error;

/// LP token of the major pool, sampled when `LP_TOKENS` is not set.
pub const DEFAULT_LP_TOKEN: &str = "0x09071c157916f859d52e39065f9a0aa252f183bb";

/// Minimum block distance between two price samples of the same LP token.
pub const DEFAULT_SKIP_BLOCKS: i64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub chain_reader_url: String,
    pub events_path: String,
    pub dedupe_events: bool,
    pub projector: ProjectorConfig,
}

/// Settings consumed by the projection handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectorConfig {
    /// Order manager contracts; empty accepts order-manager events from any address.
    pub order_managers: Vec<Address>,
    pub lp_tokens: Vec<Address>,
    pub skip_blocks: i64,
    pub native_token: Address,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            order_managers: Vec::new(),
            lp_tokens: Address::parse(DEFAULT_LP_TOKEN).into_iter().collect(),
            skip_blocks: DEFAULT_SKIP_BLOCKS,
            native_token: Address::native(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_address_list(key: &str, raw: &str) -> Result<Vec<Address>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Address::parse(s)
                .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
        })
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = required(&env_map, "DATABASE_PATH")?;
        let chain_reader_url = required(&env_map, "CHAIN_READER_URL")?;
        let events_path = required(&env_map, "EVENTS_PATH")?;

        let order_managers = match env_map.get("ORDER_MANAGERS") {
            Some(raw) => parse_address_list("ORDER_MANAGERS", raw)?,
            None => Vec::new(),
        };

        let lp_tokens = parse_address_list(
            "LP_TOKENS",
            env_map
                .get("LP_TOKENS")
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_LP_TOKEN),
        )?;

        let skip_blocks = match env_map.get("SKIP_BLOCKS") {
            Some(raw) => raw.trim().parse::<i64>().ok().filter(|n| *n >= 0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SKIP_BLOCKS".to_string(),
                    "must be a non-negative integer".to_string(),
                )
            })?,
            None => DEFAULT_SKIP_BLOCKS,
        };

        let native_token = match env_map.get("NATIVE_TOKEN") {
            Some(raw) => Address::parse(raw)
                .map_err(|e| ConfigError::InvalidValue("NATIVE_TOKEN".to_string(), e.to_string()))?,
            None => Address::native(),
        };

        let dedupe_events = match env_map
            .get("DEDUPE_EVENTS")
            .map(|s| s.as_str())
            .unwrap_or("true")
        {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "DEDUPE_EVENTS".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        Ok(Config {
            port,
            database_path,
            chain_reader_url,
            events_path,
            dedupe_events,
            projector: ProjectorConfig {
                order_managers,
                lp_tokens,
                skip_blocks,
                native_token,
            },
        })
    }
}
