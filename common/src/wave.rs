use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::abi::{NewWave, Wave};

/// A wave as displayed by the portal.
///
/// Records are materialized from `getAllWaves()` on load and from `NewWave`
/// events afterwards. They are never edited once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveRecord {
    pub sender: Address,
    pub posted_at: DateTime<Utc>,
    pub text: String,
}

impl WaveRecord {
    pub fn new(sender: Address, posted_at: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            sender,
            posted_at,
            text: text.into(),
        }
    }
}

impl From<Wave> for WaveRecord {
    fn from(wave: Wave) -> Self {
        Self {
            sender: wave.waver,
            posted_at: timestamp_from_chain(wave.timestamp),
            text: wave.message,
        }
    }
}

impl From<NewWave> for WaveRecord {
    fn from(event: NewWave) -> Self {
        Self {
            sender: event.from,
            posted_at: timestamp_from_chain(event.timestamp),
            text: event.message,
        }
    }
}

/// Convert a contract timestamp (seconds since the epoch) to UTC.
///
/// Values past what `DateTime` can hold saturate to `DateTime::<Utc>::MAX_UTC`.
pub fn timestamp_from_chain(seconds: U256) -> DateTime<Utc> {
    u64::try_from(seconds)
        .ok()
        .and_then(|s| i64::try_from(s).ok())
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Inverse of [`timestamp_from_chain`] for instants at or after the epoch.
pub fn timestamp_to_chain(at: DateTime<Utc>) -> U256 {
    U256::from(at.timestamp().max(0) as u64)
}
