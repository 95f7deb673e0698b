use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub logging: LoggingConfig,
    pub publisher: PublisherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `json`, `pretty`, anything else falls back to the default formatter
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// Publish pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Exchange every tracked publish is sent to
    pub exchange: String,
    /// Routing key every tracked publish is sent with
    pub routing_key: String,
    /// Republish attempts allowed before a message is abandoned
    pub max_retries: u32,
    /// Delay between unconfirmed (alert) sweeps
    pub unconfirmed_sweep_interval: Duration,
    /// Age after which an unconfirmed publish is alerted on and retried
    pub max_unconfirmed_age: Duration,
    /// Delay between retry sweeps
    pub retry_sweep_interval: Duration,
    /// Nacks drained per retry sweep
    pub retry_batch_size: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            exchange: "tis.trainee".to_string(),
            routing_key: "coj.signed".to_string(),
            max_retries: 3,
            unconfirmed_sweep_interval: Duration::from_secs(5),
            max_unconfirmed_age: Duration::from_secs(10),
            retry_sweep_interval: Duration::from_secs(10),
            retry_batch_size: 100,
        }
    }
}

impl PublisherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.unconfirmed_sweep_interval.is_zero() {
            return Err(AppError::ConfigurationError(
                "unconfirmed sweep interval must be greater than zero".to_string(),
            ));
        }
        if self.retry_sweep_interval.is_zero() {
            return Err(AppError::ConfigurationError(
                "retry sweep interval must be greater than zero".to_string(),
            ));
        }
        if self.max_unconfirmed_age.is_zero() {
            return Err(AppError::ConfigurationError(
                "max unconfirmed age must be greater than zero".to_string(),
            ));
        }
        if self.retry_batch_size == 0 {
            return Err(AppError::ConfigurationError(
                "retry batch size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn init() -> Result<Config> {
        let defaults = PublisherConfig::default();

        let port = parse_var("PORT", 8000u16)?;

        let logging = LoggingConfig {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_owned()),
        };

        let publisher = PublisherConfig {
            exchange: std::env::var("PUBLISHER_EXCHANGE").unwrap_or(defaults.exchange),
            routing_key: std::env::var("PUBLISHER_ROUTING_KEY").unwrap_or(defaults.routing_key),
            max_retries: parse_var("PUBLISHER_MAX_RETRIES", defaults.max_retries)?,
            unconfirmed_sweep_interval: Duration::from_secs(parse_var(
                "PUBLISHER_UNCONFIRMED_SWEEP_INTERVAL_SECS",
                defaults.unconfirmed_sweep_interval.as_secs(),
            )?),
            max_unconfirmed_age: Duration::from_secs(parse_var(
                "PUBLISHER_MAX_UNCONFIRMED_AGE_SECS",
                defaults.max_unconfirmed_age.as_secs(),
            )?),
            retry_sweep_interval: Duration::from_secs(parse_var(
                "PUBLISHER_RETRY_SWEEP_INTERVAL_SECS",
                defaults.retry_sweep_interval.as_secs(),
            )?),
            retry_batch_size: parse_var("PUBLISHER_RETRY_BATCH_SIZE", defaults.retry_batch_size)?,
        };
        publisher.validate()?;

        Ok(Config {
            port,
            logging,
            publisher,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| {
            AppError::ConfigurationError(format!("{} must be a number: {}", name, e))
        }),
        Err(_) => Ok(default),
    }
}
