//! Server error types.

use std::fmt;

use sealgate_crypto::CryptoError;

use crate::{keyring::KeyRingError, storage::StorageError};

/// Errors that stop the server from starting or running.
///
/// Per-request failures never become a `ServerError`; they are answered with
/// a [`Rejection`](sealgate_core::Rejection) instead.
#[derive(Debug)]
pub enum ServerError {
    /// Invalid configuration (zero interval, undersized key, bad path).
    ///
    /// Fatal at startup. Fix configuration and restart.
    Config(String),

    /// The record store could not be opened.
    Storage(StorageError),

    /// The initial keypair could not be generated.
    ///
    /// Later rotation failures are logged and survived; only the first one
    /// is fatal, since nothing can be served without a key.
    Crypto(CryptoError),

    /// Unexpected runtime failure (signal handler, task join).
    Internal(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Crypto(err) => write!(f, "crypto error: {err}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Crypto(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for ServerError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<KeyRingError> for ServerError {
    fn from(err: KeyRingError) -> Self {
        match err {
            KeyRingError::Generation(err) => Self::Crypto(err),
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
