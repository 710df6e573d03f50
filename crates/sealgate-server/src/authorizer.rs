//! Privilege checks by session-key fingerprint.
//!
//! A privileged login stores the fingerprint of the session key it arrived
//! with. Later requests count as privileged only if their verified key has
//! the same fingerprint. There is no token table and no expiry: the next
//! privileged login overwrites the fingerprint, which is the only way the
//! previous session stops being valid. One privileged session per account.

use sealgate_core::VerifiedSession;

use crate::storage::{ADMIN_FINGERPRINT_FIELD, RecordStore, StorageError};

/// Grants elevated privilege to the holder of an account's latest key.
#[derive(Clone)]
pub struct AdministratorAuthorizer<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> AdministratorAuthorizer<S> {
    /// Authorizer reading fingerprints from `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// True only if `session`'s fingerprint equals the one stored for
    /// `owner`.
    ///
    /// An owner with no stored fingerprint (never logged in with privilege,
    /// or cleared) is never privileged, whatever key is presented.
    pub fn is_privileged(&self, owner: &str, session: &VerifiedSession) -> Result<bool, StorageError> {
        let stored = self.store.get(owner, ADMIN_FINGERPRINT_FIELD)?;

        let privileged = match stored {
            Some(fingerprint) if !fingerprint.is_empty() => fingerprint == session.fingerprint(),
            _ => false,
        };

        tracing::debug!(owner, privileged, "privilege check");
        Ok(privileged)
    }

    /// Record `session` as the owner's privileged session.
    ///
    /// Called after a successful privileged login. Supersedes whatever
    /// session was recorded before.
    pub fn record_login(&self, owner: &str, session: &VerifiedSession) -> Result<(), StorageError> {
        self.store.set(owner, ADMIN_FINGERPRINT_FIELD, &session.fingerprint())?;
        tracing::info!(owner, "privileged session recorded");
        Ok(())
    }

    /// Forget the owner's privileged session.
    pub fn revoke(&self, owner: &str) -> Result<(), StorageError> {
        self.store.set(owner, ADMIN_FINGERPRINT_FIELD, "")
    }
}
