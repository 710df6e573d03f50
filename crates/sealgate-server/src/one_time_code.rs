//! Short-lived numeric verification codes.
//!
//! `issue` stores a fresh six-digit code in the owner's row and arms a timer
//! that clears it after the TTL. Each owner has at most one armed timer:
//! reissuing replaces both code and timer under one lock, and every timer
//! carries a ticket so that a timer which already woke up cannot clear a
//! code issued after it.
//!
//! ```text
//! issue ──► [code stored, timer armed] ──ttl──► [cleared]
//!               │        │
//!               │        └── redeem(ok) ──► [redeemed flag set, cleared]
//!               └── cancel ──► [code stored, no timer]
//! ```

#![allow(clippy::disallowed_types, reason = "Timer table lock is never held across an await")]
#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use sealgate_core::Environment;
use tokio::task::JoinHandle;

use crate::storage::{ONE_TIME_CODE_FIELD, REDEEMED_FIELD, RecordStore, StorageError};

/// Lowest code; codes are always six digits without a leading zero.
const CODE_MIN: u64 = 100_000;

/// Number of distinct codes.
const CODE_SPAN: u64 = 900_000;

/// Issues, expires and redeems one-time codes.
///
/// Clone shares the timer table. `issue` spawns a tokio task and must be
/// called from within a runtime.
#[derive(Clone)]
pub struct OneTimeCodes<S: RecordStore, E: Environment> {
    store: S,
    env: E,
    ttl: Duration,
    timers: Arc<Mutex<Timers>>,
}

#[derive(Default)]
struct Timers {
    armed: HashMap<String, Timer>,
    next_ticket: u64,
}

struct Timer {
    ticket: u64,
    handle: JoinHandle<()>,
}

impl<S: RecordStore, E: Environment> OneTimeCodes<S, E> {
    /// Codes stored in `store`, each cleared `ttl` after issue.
    pub fn new(store: S, env: E, ttl: Duration) -> Self {
        Self { store, env, ttl, timers: Arc::new(Mutex::new(Timers::default())) }
    }

    /// Generate, store and arm a new code for `owner`.
    ///
    /// Replaces any outstanding code; its timer is cancelled so it cannot
    /// clear the new one. On a storage error the previous code and timer are
    /// left as they were.
    pub fn issue(&self, owner: &str) -> Result<String, StorageError> {
        let code = self.generate();

        let mut timers = self.timers.lock().expect("code timers poisoned");
        self.store.set(owner, ONE_TIME_CODE_FIELD, &code)?;

        if let Some(previous) = timers.armed.remove(owner) {
            previous.handle.abort();
        }

        timers.next_ticket += 1;
        let ticket = timers.next_ticket;
        let handle = tokio::spawn(self.clone().expire(owner.to_string(), ticket));
        timers.armed.insert(owner.to_string(), Timer { ticket, handle });

        tracing::debug!(owner, ttl_secs = self.ttl.as_secs(), "one-time code issued");
        Ok(code)
    }

    /// Stop the owner's timer, leaving the stored code in place.
    ///
    /// Returns false if no timer was armed.
    pub fn cancel(&self, owner: &str) -> bool {
        let removed = self.timers.lock().expect("code timers poisoned").armed.remove(owner);

        match removed {
            Some(timer) => {
                timer.handle.abort();
                true
            },
            None => false,
        }
    }

    /// Compare `candidate` with the owner's stored code.
    ///
    /// Never clears anything. A cleared (expired or redeemed) code matches
    /// nothing.
    pub fn validate(&self, owner: &str, candidate: &str) -> Result<bool, StorageError> {
        let stored = self.store.get(owner, ONE_TIME_CODE_FIELD)?;
        Ok(matches!(stored, Some(code) if !code.is_empty() && code == candidate))
    }

    /// Validate and consume in one step.
    ///
    /// Holds the timer lock throughout, so expiry cannot interleave. On a
    /// match the owner's redeemed flag is set, then the code cleared and its
    /// timer stopped. On a mismatch nothing changes and the code keeps
    /// expiring on schedule.
    ///
    /// The flag is written first: if clearing the code then fails, the
    /// redemption is still on record and the code may be redeemed again.
    pub fn redeem(&self, owner: &str, candidate: &str) -> Result<bool, StorageError> {
        let mut timers = self.timers.lock().expect("code timers poisoned");

        if !self.validate(owner, candidate)? {
            tracing::debug!(owner, "one-time code rejected");
            return Ok(false);
        }

        self.store.set(owner, REDEEMED_FIELD, "true")?;
        self.store.set(owner, ONE_TIME_CODE_FIELD, "")?;
        if let Some(timer) = timers.armed.remove(owner) {
            timer.handle.abort();
        }

        tracing::debug!(owner, "one-time code redeemed");
        Ok(true)
    }

    /// Consume the owner's redeemed flag.
    ///
    /// True at most once per successful [`redeem`](Self::redeem); the
    /// follow-up action it authorizes (a password reset, say) cannot be
    /// replayed.
    pub fn take_redemption(&self, owner: &str) -> Result<bool, StorageError> {
        let _timers = self.timers.lock().expect("code timers poisoned");

        if self.store.get(owner, REDEEMED_FIELD)?.as_deref() != Some("true") {
            return Ok(false);
        }
        self.store.set(owner, REDEEMED_FIELD, "")?;
        Ok(true)
    }

    /// Owners with an armed timer.
    pub fn armed(&self) -> usize {
        self.timers.lock().expect("code timers poisoned").armed.len()
    }

    /// Uniform six-digit code by rejection sampling.
    fn generate(&self) -> String {
        let zone = u64::MAX - (u64::MAX % CODE_SPAN);
        loop {
            let value = self.env.random_u64();
            if value < zone {
                return (CODE_MIN + value % CODE_SPAN).to_string();
            }
        }
    }

    async fn expire(self, owner: String, ticket: u64) {
        self.env.sleep(self.ttl).await;

        let mut timers = self.timers.lock().expect("code timers poisoned");
        if timers.armed.get(&owner).is_none_or(|timer| timer.ticket != ticket) {
            return;
        }
        timers.armed.remove(&owner);

        match self.store.set(&owner, ONE_TIME_CODE_FIELD, "") {
            Ok(()) => tracing::debug!(owner, "one-time code expired"),
            Err(err) => tracing::warn!(owner, error = %err, "failed to clear expired one-time code"),
        }
    }
}
