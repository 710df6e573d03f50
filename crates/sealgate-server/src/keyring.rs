//! Live RSA keypair and its rotation.
//!
//! Exactly one keypair is live at a time. Readers clone an `Arc` to the live
//! entry under a read lock and never see a half-installed key. A rotation
//! generates the replacement outside every lock, then swaps it in through
//! the notifier's `on_rotate` so that the swap and the subscriber drain
//! happen under the same registry lock.
//!
//! Generation failure is survivable: the previous keypair stays live, the
//! failure is logged, and the next scheduled rotation tries again.

#![allow(clippy::disallowed_types, reason = "Live key swap is a short synchronous section")]
#![allow(clippy::expect_used, reason = "Lock poisoning should cause a panic")]

use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use sealgate_core::Environment;
use sealgate_crypto::{CryptoError, RsaKeyPair};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::notifier::{Subscription, UpdateNotifier};

/// Key rotation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyRingError {
    /// A new keypair could not be generated; the previous one stays live.
    #[error("key generation failed: {0}")]
    Generation(#[from] CryptoError),
}

/// Produces fresh keypairs for the ring.
///
/// Production uses [`RsaGenerator`]; tests substitute one that fails on
/// demand.
pub trait KeyGenerator<E: Environment>: Send + Sync + 'static {
    /// Generate a keypair with the given modulus size.
    fn generate(&self, env: &E, modulus_bits: usize) -> Result<RsaKeyPair, CryptoError>;
}

/// RSA generation from the environment's RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaGenerator;

impl<E: Environment> KeyGenerator<E> for RsaGenerator {
    fn generate(&self, env: &E, modulus_bits: usize) -> Result<RsaKeyPair, CryptoError> {
        RsaKeyPair::generate(&mut env.rng(), modulus_bits)
    }
}

/// The live keypair with its publication metadata.
pub(crate) struct LiveKeyPair<I> {
    pub(crate) keypair: RsaKeyPair,
    pub(crate) public_key: String,
    pub(crate) epoch: u64,
    pub(crate) installed_at: I,
}

/// Process-wide owner of the live keypair.
///
/// Clone shares the ring. Construction performs the first rotation, so a
/// `KeyRing` always has a live key.
pub struct KeyRing<E: Environment> {
    live: Arc<RwLock<Arc<LiveKeyPair<E::Instant>>>>,
    notifier: UpdateNotifier<E>,
    generator: Arc<dyn KeyGenerator<E>>,
    env: E,
    modulus_bits: usize,
}

impl<E: Environment> Clone for KeyRing<E> {
    fn clone(&self) -> Self {
        Self {
            live: Arc::clone(&self.live),
            notifier: self.notifier.clone(),
            generator: Arc::clone(&self.generator),
            env: self.env.clone(),
            modulus_bits: self.modulus_bits,
        }
    }
}

impl<E: Environment> KeyRing<E> {
    /// Ring with RSA keys of `modulus_bits`, first key already live.
    pub fn new(env: E, modulus_bits: usize) -> Result<Self, KeyRingError> {
        Self::with_generator(env, modulus_bits, RsaGenerator)
    }

    /// Ring with a custom key source, first key already live.
    ///
    /// The initial key is epoch 0. No subscriber can exist yet, so it is
    /// installed without going through the notifier.
    ///
    /// # Errors
    ///
    /// `Generation` if the initial key cannot be produced. Unlike later
    /// rotations this is fatal: there is nothing to serve.
    pub fn with_generator(
        env: E,
        modulus_bits: usize,
        generator: impl KeyGenerator<E>,
    ) -> Result<Self, KeyRingError> {
        let keypair = generator.generate(&env, modulus_bits)?;
        let initial = LiveKeyPair {
            public_key: keypair.public_key().to_base64(),
            keypair,
            epoch: 0,
            installed_at: env.now(),
        };

        tracing::info!(modulus_bits, "initial keypair installed");

        Ok(Self {
            live: Arc::new(RwLock::new(Arc::new(initial))),
            notifier: UpdateNotifier::new(env.clone()),
            generator: Arc::new(generator),
            env,
            modulus_bits,
        })
    }

    /// Replace the live keypair and notify every pending subscriber.
    ///
    /// Returns the new epoch.
    ///
    /// # Errors
    ///
    /// `Generation` if no keypair could be produced. The previous keypair
    /// stays live and no subscriber is notified.
    pub fn rotate(&self) -> Result<u64, KeyRingError> {
        let keypair = self.generator.generate(&self.env, self.modulus_bits).map_err(|err| {
            tracing::error!(error = %err, epoch = self.epoch(), "key rotation failed, previous key stays live");
            KeyRingError::Generation(err)
        })?;

        let public_key = keypair.public_key().to_base64();
        let installed_at = self.env.now();
        let mut installed_epoch = 0;

        let delivered = self.notifier.on_rotate(&public_key, |epoch| {
            installed_epoch = epoch;
            let next = LiveKeyPair { keypair, public_key: public_key.clone(), epoch, installed_at };
            *self.live.write().expect("live key lock poisoned") = Arc::new(next);
        });

        tracing::info!(epoch = installed_epoch, delivered, "keypair rotated");
        Ok(installed_epoch)
    }

    /// Rotate every `interval` until the returned task is aborted.
    ///
    /// The first rotation happens one interval after the call. A failed or
    /// slow rotation delays the next one rather than bunching them up.
    /// Each rotation runs on the blocking pool: RSA generation takes long
    /// enough to stall an async worker.
    pub fn spawn_rotation(&self, interval: Duration) -> JoinHandle<()> {
        let ring = self.clone();

        tokio::spawn(async move {
            loop {
                ring.env.sleep(interval).await;

                let rotating = ring.clone();
                // Failures are logged by rotate; the schedule carries on.
                if let Err(err) = tokio::task::spawn_blocking(move || rotating.rotate()).await {
                    tracing::error!(error = %err, "rotation task did not complete");
                }
            }
        })
    }

    /// Base64 DER of the live public key.
    pub fn current_public_key(&self) -> String {
        self.current().public_key.clone()
    }

    /// The live public key together with its epoch, read atomically.
    pub fn current_public_key_with_epoch(&self) -> (String, u64) {
        let live = self.current();
        (live.public_key.clone(), live.epoch)
    }

    /// Number of successful rotations since construction.
    pub fn epoch(&self) -> u64 {
        self.current().epoch
    }

    /// Time since the live key was installed.
    pub fn key_age(&self) -> Duration {
        self.env.now() - self.current().installed_at
    }

    /// Subscribe to the next rotation.
    pub fn subscribe(&self, timeout: Duration) -> Subscription<E> {
        self.notifier.subscribe(timeout)
    }

    /// Subscribe to the first rotation after `epoch`.
    pub fn subscribe_since(&self, epoch: u64, timeout: Duration) -> Subscription<E> {
        self.notifier.subscribe_since(epoch, timeout)
    }

    /// Registry of pending subscriptions.
    ///
    /// Read-only outside this crate: keys reach subscribers only through
    /// [`rotate`](Self::rotate).
    ///
    /// ```compile_fail
    /// use sealgate_server::{KeyRing, SystemEnv};
    ///
    /// fn forge(ring: &KeyRing<SystemEnv>) {
    ///     ring.notifier().on_rotate("not-the-live-key", |_| {});
    /// }
    /// ```
    pub fn notifier(&self) -> &UpdateNotifier<E> {
        &self.notifier
    }

    /// Snapshot of the live entry, private key included.
    pub(crate) fn current(&self) -> Arc<LiveKeyPair<E::Instant>> {
        Arc::clone(&self.live.read().expect("live key lock poisoned"))
    }
}
