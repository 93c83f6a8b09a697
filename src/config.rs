use std::{fs, time::Duration};

use anyhow::{anyhow, Result};
use log::{debug, error, info};
use serde::Deserialize;

use crate::rate::MAX_MESSAGE_SIZE;

const INITIAL_CAPACITY_DEFAULT: f64 = 1.0;
const TARGET_RTT_MS_DEFAULT: u64 = 2000;
const MAX_CACHED_BLOCKS_DEFAULT: usize = 1024;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    // items/second for the first peer, before any measurement
    #[serde(default = "initial_capacity_default")]
    pub initial_capacity: f64,

    #[serde(default = "target_rtt_ms_default")]
    pub target_rtt_ms: u64,

    #[serde(default = "max_message_size_default")]
    pub max_message_size: usize,

    // 0 disables fallback eviction
    #[serde(default = "max_cached_blocks_default")]
    pub max_cached_blocks: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl Config {
    pub fn new(config_path: &str) -> Result<Self> {
        info!("Using configuration file {config_path}. ");

        let config = fs::read_to_string(config_path)?;
        Self::from_yaml(&config)
    }

    pub fn from_yaml(config: &str) -> Result<Self> {
        let config = config.trim();
        let config: Self = if config.is_empty() {
            serde_yaml::from_str("{}")?
        } else {
            serde_yaml::from_str(config)?
        };

        if !config.initial_capacity.is_finite() || config.initial_capacity <= 0.0 {
            error!("config.initial_capacity must be positive, got {}. ", config.initial_capacity);
            return Err(anyhow!("invalid configuration"));
        }

        if config.target_rtt_ms == 0 {
            error!("config.target_rtt_ms must be positive. ");
            return Err(anyhow!("invalid configuration"));
        }

        if config.max_message_size == 0 {
            error!("config.max_message_size must be at least 1. ");
            return Err(anyhow!("invalid configuration"));
        }

        Ok(config)
    }

    pub fn target_rtt(&self) -> Duration {
        Duration::from_millis(self.target_rtt_ms)
    }
}

fn initial_capacity_default() -> f64 {
    debug!("Defaulting config.initial_capacity to {INITIAL_CAPACITY_DEFAULT}. ");
    INITIAL_CAPACITY_DEFAULT
}

fn target_rtt_ms_default() -> u64 {
    debug!("Defaulting config.target_rtt_ms to {TARGET_RTT_MS_DEFAULT}. ");
    TARGET_RTT_MS_DEFAULT
}

fn max_message_size_default() -> usize {
    debug!("Defaulting config.max_message_size to {MAX_MESSAGE_SIZE}. ");
    MAX_MESSAGE_SIZE
}

fn max_cached_blocks_default() -> usize {
    debug!("Defaulting config.max_cached_blocks to {MAX_CACHED_BLOCKS_DEFAULT}. ");
    MAX_CACHED_BLOCKS_DEFAULT
}
