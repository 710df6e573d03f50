//! Seeded simulation environment.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]
#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sealgate_core::Environment;

/// Environment with a seeded ChaCha RNG and tokio's clock.
///
/// Inside `#[tokio::test(start_paused = true)]` the clock only moves when
/// every task is idle, so timers fire instantly and in a reproducible order.
/// Clones share the RNG stream.
#[derive(Clone)]
pub struct SimEnv {
    seed: u64,
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SimEnv {
    /// Environment whose randomness is fully determined by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))) }
    }

    /// Seed this environment was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().expect("SimEnv RNG mutex poisoned").fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(42);
        let b = SimEnv::with_seed(42);

        let mut left = [0u8; 32];
        let mut right = [0u8; 32];
        a.random_bytes(&mut left);
        b.random_bytes(&mut right);

        assert_eq!(left, right);
    }

    #[test]
    fn clones_share_the_stream() {
        let env = SimEnv::with_seed(7);
        let clone = env.clone();

        assert_ne!(env.random_u64(), clone.random_u64());
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_advances_virtual_time() {
        let env = SimEnv::with_seed(1);
        let start = env.now();

        env.sleep(Duration::from_secs(600)).await;

        assert!(env.now() - start >= Duration::from_secs(600));
    }
}
