//! Error types for the hybrid session protocol.
//!
//! Every failure is handled at the boundary of the request that caused it.
//! [`SessionError`] is what protocol code matches on; [`Rejection`] is what a
//! caller is allowed to see.

use thiserror::Error;

/// Errors while recovering, verifying or using a session key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The asymmetric ciphertext did not yield a key.
    ///
    /// Covers malformed Base64, an empty blob, and any block that failed to
    /// decrypt (wrong or rotated public key, corruption). Which block failed
    /// is not recorded.
    #[error("symmetric key recovery failed")]
    KeyRecovery,

    /// The recovered key did not decrypt the marker to the expected value.
    #[error("symmetric key verification failed")]
    KeyVerification,

    /// A payload field could not be opened.
    #[error("decryption failed: {reason}")]
    Decrypt {
        /// What went wrong (encoding, padding, cipher)
        reason: String,
    },

    /// A response could not be sealed.
    #[error("encryption failed: {reason}")]
    Encrypt {
        /// What went wrong
        reason: String,
    },

    /// The request did not carry a field the operation needs.
    #[error("missing field: {0}")]
    MissingField(String),
}

impl SessionError {
    /// True for failures of the key itself (recovery or verification).
    ///
    /// Callers must answer these with the same generic rejection so that the
    /// failing stage is not revealed.
    pub fn is_key_rejection(&self) -> bool {
        matches!(self, Self::KeyRecovery | Self::KeyVerification)
    }
}

/// Outcome reported to the caller when a request is refused.
///
/// Key problems collapse into one variant, distinct from any business-level
/// "wrong credentials" answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Key recovery or verification failed
    KeyRejected,
    /// A payload field was missing or could not be opened
    MalformedField,
    /// Anything else (store failure, sealing failure)
    Internal,
}

impl Rejection {
    /// Stable wire token for this rejection.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyRejected => "KEY_REJECTED",
            Self::MalformedField => "MALFORMED",
            Self::Internal => "ERROR",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&SessionError> for Rejection {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::KeyRecovery | SessionError::KeyVerification => Self::KeyRejected,
            SessionError::Decrypt { .. } | SessionError::MissingField(_) => Self::MalformedField,
            SessionError::Encrypt { .. } => Self::Internal,
        }
    }
}
