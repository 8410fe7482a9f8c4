use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{address, Address};

/// Contract the portal talks to unless `WAVE_PORTAL_ADDRESS` says otherwise.
pub const DEFAULT_CONTRACT_ADDRESS: Address = address!("6a30855ca4caf1e71f437d90106ec5fbc36a68a2");

/// How often a pending transaction's receipt is polled.
pub const DEFAULT_CONFIRMATION_POLL: Duration = Duration::from_millis(1_500);

/// How often new contract logs are polled.
pub const DEFAULT_LOG_POLL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid contract address {0:?}")]
    InvalidAddress(String),
}

/// Runtime configuration for the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub contract_address: Address,
    pub confirmation_poll: Duration,
    pub log_poll: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONTRACT_ADDRESS)
    }
}

impl PortalConfig {
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address,
            confirmation_poll: DEFAULT_CONFIRMATION_POLL,
            log_poll: DEFAULT_LOG_POLL,
        }
    }

    /// Build from compile-time configuration.
    ///
    /// `WAVE_PORTAL_ADDRESS` replaces the default contract address when set
    /// at build time.
    pub fn from_env() -> Result<Self, ConfigError> {
        match option_env!("WAVE_PORTAL_ADDRESS") {
            Some(raw) => Ok(Self::new(parse_address(raw)?)),
            None => Ok(Self::default()),
        }
    }

    /// Replace the contract address, e.g. from a `?contract=` query parameter.
    pub fn with_contract_override(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.contract_address = parse_address(raw)?;
        Ok(self)
    }
}

fn parse_address(raw: &str) -> Result<Address, ConfigError> {
    Address::from_str(raw.trim()).map_err(|_| ConfigError::InvalidAddress(raw.to_string()))
}
