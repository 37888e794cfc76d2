use std::time::Duration;

use serde::Deserialize;

use crate::error::EngineError;

/// Root configuration, parsed from TOML. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct HeraldConfig {
    /// HTTP API port.
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            cache: CacheConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

fn default_api_port() -> u16 {
    8080
}

/// Correlation cache retention and hand-off.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheConfig {
    /// Seconds an entry survives after its last write.
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,

    /// Seconds between expiry sweeps.
    #[serde(default = "default_cleanup_secs")]
    pub cleanup_secs: u64,

    /// Capacity of the channel feeding the cache writer.
    /// Publishers wait on enqueue once it is full.
    #[serde(default = "default_queue")]
    pub queue: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            idle_secs: default_idle_secs(),
            cleanup_secs: default_cleanup_secs(),
            queue: default_queue(),
        }
    }
}

impl CacheConfig {
    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_secs)
    }
}

fn default_idle_secs() -> u64 {
    5 * 60
}
fn default_cleanup_secs() -> u64 {
    10 * 60
}
fn default_queue() -> usize {
    1024
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeliveryConfig {
    /// Overall timeout of one delivery attempt, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DeliveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    60
}

impl HeraldConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let zero = |field: &str| EngineError::Config(format!("{field} must be greater than zero"));
        if self.cache.idle_secs == 0 {
            return Err(zero("cache.idle_secs"));
        }
        if self.cache.cleanup_secs == 0 {
            return Err(zero("cache.cleanup_secs"));
        }
        if self.cache.queue == 0 {
            return Err(zero("cache.queue"));
        }
        if self.delivery.timeout_secs == 0 {
            return Err(zero("delivery.timeout_secs"));
        }
        Ok(())
    }
}
