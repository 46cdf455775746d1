//! Calculation settings shared by model construction and batch projection.

#[cfg(feature = "ecs")]
use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Worker allocation of a batch projection.
///
/// Serialized as an integer: `-1` runs the scenarios one after the other on the calling
/// thread, `0` uses every hardware thread, `n > 0` uses exactly `n` workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Threading {
    #[default]
    Sequential,
    Auto,
    Fixed(usize),
}

impl TryFrom<i64> for Threading {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Threading::Sequential),
            0 => Ok(Threading::Auto),
            n if n > 0 => Ok(Threading::Fixed(n as usize)),
            n => Err(ConfigError::InvalidThreading(n)),
        }
    }
}

impl From<Threading> for i64 {
    fn from(threading: Threading) -> Self {
        match threading {
            Threading::Sequential => -1,
            Threading::Auto => 0,
            Threading::Fixed(n) => n as i64,
        }
    }
}

/// Settings of one calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ecs", derive(Resource))]
#[serde(default)]
pub struct CalculationConfig {
    /// Grid frequency in Hz, used for line capacitance.
    pub system_frequency: f64,
    pub threading: Threading,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            system_frequency: 50.0,
            threading: Threading::Sequential,
        }
    }
}

impl CalculationConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
