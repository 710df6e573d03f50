//! Chaotic record store wrapper for fault injection testing
//!
//! Randomly fails reads and writes so tests can check that a storage failure
//! stays confined to the request that hit it.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]
#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::sync::{Arc, Mutex};

use super::{RecordStore, StorageError};

/// Record store wrapper that injects failures at a fixed rate.
///
/// Delegates to an underlying store. Deterministic for a given seed.
#[derive(Clone)]
pub struct ChaoticRecordStore<S: RecordStore> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    rng: Arc<Mutex<Lcg>>,
}

/// Linear congruential generator, fast and reproducible.
struct Lcg {
    state: u64,
}

impl Lcg {
    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // Numerical Recipes constants
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: RecordStore> ChaoticRecordStore<S> {
    /// Wrap `inner`, failing roughly `failure_rate` of operations.
    ///
    /// The rate is clamped to [0.0, 1.0].
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        Self {
            inner,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            rng: Arc::new(Mutex::new(Lcg { state: seed })),
        }
    }

    /// Underlying store (for checking state after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn should_fail(&self) -> bool {
        self.rng.lock().expect("Lcg mutex poisoned").next() < self.failure_rate
    }
}

impl<S: RecordStore> RecordStore for ChaoticRecordStore<S> {
    fn get(&self, owner: &str, field: &str) -> Result<Option<String>, StorageError> {
        if self.should_fail() {
            return Err(StorageError::Injected);
        }
        self.inner.get(owner, field)
    }

    fn set(&self, owner: &str, field: &str, value: &str) -> Result<(), StorageError> {
        if self.should_fail() {
            return Err(StorageError::Injected);
        }
        self.inner.set(owner, field, value)
    }
}
