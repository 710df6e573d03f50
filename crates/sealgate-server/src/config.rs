//! Server configuration.

use std::{path::PathBuf, time::Duration};

use sealgate_core::ProtocolConfig;

use crate::ServerError;

/// Smallest RSA modulus the server will generate.
///
/// Below this, a 32-byte AES key no longer fits in one PKCS#1 block and
/// generation itself becomes unreliable.
pub const MIN_KEY_BITS: usize = 512;

/// Runtime configuration for the key lifecycle and code services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// RSA modulus size in bits
    pub key_bits: usize,
    /// Time between scheduled key rotations
    pub rotation_interval: Duration,
    /// How long a key-update subscription waits before timing out
    pub subscription_timeout: Duration,
    /// Lifetime of an issued one-time code
    pub code_ttl: Duration,
    /// Protocol constants shared with clients
    pub protocol: ProtocolConfig,
    /// Redb file for durable records; in-memory when `None`
    pub store_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            key_bits: sealgate_crypto::DEFAULT_MODULUS_BITS,
            rotation_interval: Duration::from_secs(600),
            subscription_timeout: Duration::from_secs(630),
            code_ttl: Duration::from_secs(600),
            protocol: ProtocolConfig::default(),
            store_path: None,
        }
    }
}

impl ServerConfig {
    /// Reject configurations the services cannot run with.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.key_bits < MIN_KEY_BITS {
            return Err(ServerError::Config(format!(
                "key_bits must be at least {MIN_KEY_BITS}, got {}",
                self.key_bits
            )));
        }
        if self.rotation_interval.is_zero() {
            return Err(ServerError::Config("rotation_interval must be non-zero".to_string()));
        }
        if self.subscription_timeout.is_zero() {
            return Err(ServerError::Config("subscription_timeout must be non-zero".to_string()));
        }
        if self.code_ttl.is_zero() {
            return Err(ServerError::Config("code_ttl must be non-zero".to_string()));
        }
        if self.protocol.marker.is_empty() {
            return Err(ServerError::Config("protocol marker must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.key_bits, 1024);
        assert_eq!(config.rotation_interval, Duration::from_secs(600));
        assert_eq!(config.subscription_timeout, Duration::from_secs(630));
    }

    #[test]
    fn zero_durations_are_rejected() {
        let configs = [
            ServerConfig { rotation_interval: Duration::ZERO, ..ServerConfig::default() },
            ServerConfig { subscription_timeout: Duration::ZERO, ..ServerConfig::default() },
            ServerConfig { code_ttl: Duration::ZERO, ..ServerConfig::default() },
        ];

        for config in configs {
            assert!(matches!(config.validate(), Err(ServerError::Config(_))));
        }
    }

    #[test]
    fn small_keys_are_rejected() {
        let config = ServerConfig { key_bits: 256, ..ServerConfig::default() };
        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
    }
}
