//! # Configuration Management
//!
//! Serde-backed configuration for the engine with environment overrides.
//! Defaults are production-sensible; every value can be overridden through
//! `EVENTFLOW__`-prefixed environment variables (for example
//! `EVENTFLOW__DISPATCHER__MAX_ATTEMPTS=5`).

use serde::{Deserialize, Serialize};

use crate::constants::system;
use crate::error::{EventFlowError, Result};

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventFlowConfig {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub events: EventConfig,
}

/// Task dispatcher retry and delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Maximum execution attempts per dispatched processor
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

/// Exponential backoff with a jitter ceiling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

/// Lifecycle event channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    pub channel_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: system::DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffConfig::default(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: system::DEFAULT_BACKOFF_INITIAL_MS,
            multiplier: system::DEFAULT_BACKOFF_MULTIPLIER,
            max_delay_ms: system::DEFAULT_BACKOFF_MAX_MS,
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: system::DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EventFlowConfig {
    /// Load configuration: defaults merged with environment overrides
    pub fn from_env() -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| EventFlowError::ConfigurationError(e.to_string()))?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::Environment::with_prefix("EVENTFLOW").separator("__"))
            .build()
            .map_err(|e| EventFlowError::ConfigurationError(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| EventFlowError::ConfigurationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.dispatcher.max_attempts == 0 {
            return Err(EventFlowError::ConfigurationError(
                "dispatcher.max_attempts must be greater than 0".to_string(),
            ));
        }
        if self.dispatcher.backoff.multiplier < 1.0 {
            return Err(EventFlowError::ConfigurationError(
                "dispatcher.backoff.multiplier must be at least 1.0".to_string(),
            ));
        }
        if self.dispatcher.backoff.initial_delay_ms > self.dispatcher.backoff.max_delay_ms {
            return Err(EventFlowError::ConfigurationError(
                "dispatcher.backoff.initial_delay_ms cannot exceed max_delay_ms".to_string(),
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(EventFlowError::ConfigurationError(
                "events.channel_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
