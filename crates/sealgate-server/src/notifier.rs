//! Key-update subscriptions.
//!
//! A client that already holds the public key can park a request here and be
//! told about the next rotation without polling. Each pending subscription
//! lives in an arena slot tagged with a generation counter, so a stale
//! handle can never remove a slot that has since been reused.
//!
//! # Exactly-once delivery
//!
//! Rotation takes the registry lock, installs the new key, drains every
//! occupied slot, releases the lock, then sends. A subscription whose
//! deadline passes takes the same lock and tries to empty its own slot:
//!
//! ```text
//! timeout fires ──► lock ──► slot still occupied? ──yes──► TimedOut
//!                                     │
//!                                     no (drained by a rotation)
//!                                     ▼
//!                          await the in-flight key ──► Rotated
//! ```
//!
//! Whichever side takes the slot first decides the outcome, so no
//! subscription resolves both ways. Subscriptions added while a rotation
//! holds the lock land after it and wait for the next one.
//!
//! Only the key ring publishes: `on_rotate` is crate-private, so every key
//! a subscriber receives is one the ring installed.

#![allow(clippy::disallowed_types, reason = "Registry lock is never held across an await")]
#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use sealgate_core::Environment;
use tokio::sync::oneshot;

/// Terminal outcome of a key-update subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyUpdate {
    /// A rotation happened; carries the new Base64 public key.
    Rotated(String),
    /// The deadline passed with no rotation.
    TimedOut,
}

/// Handle to an arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    index: usize,
    generation: u64,
}

/// Registry of pending key-update subscriptions.
///
/// Clone shares the registry. Obtained through
/// [`KeyRing::notifier`](crate::KeyRing::notifier).
#[derive(Clone)]
pub struct UpdateNotifier<E: Environment> {
    registry: Arc<Mutex<Registry>>,
    env: E,
}

struct Registry {
    slots: Vec<Slot>,
    free: Vec<usize>,
    /// Number of rotations published so far
    epoch: u64,
    /// Public key published by the last rotation
    latest: Option<String>,
}

struct Slot {
    generation: u64,
    waiter: Option<oneshot::Sender<String>>,
}

impl Registry {
    fn insert(&mut self, waiter: oneshot::Sender<String>) -> SubscriptionId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.generation += 1;
            slot.waiter = Some(waiter);
            return SubscriptionId { index, generation: slot.generation };
        }

        self.slots.push(Slot { generation: 0, waiter: Some(waiter) });
        SubscriptionId { index: self.slots.len() - 1, generation: 0 }
    }

    /// Empty the slot if it still belongs to `id`. False if a rotation
    /// already took it.
    fn remove(&mut self, id: SubscriptionId) -> bool {
        match self.slots.get_mut(id.index) {
            Some(slot) if slot.generation == id.generation && slot.waiter.is_some() => {
                slot.waiter = None;
                self.free.push(id.index);
                true
            },
            _ => false,
        }
    }

    fn drain(&mut self) -> Vec<oneshot::Sender<String>> {
        let mut waiters = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(waiter) = slot.waiter.take() {
                self.free.push(index);
                waiters.push(waiter);
            }
        }
        waiters
    }

    fn pending(&self) -> usize {
        self.slots.iter().filter(|slot| slot.waiter.is_some()).count()
    }
}

impl<E: Environment> UpdateNotifier<E> {
    /// Empty registry; deadlines are measured with `env`.
    pub(crate) fn new(env: E) -> Self {
        let registry = Registry { slots: Vec::new(), free: Vec::new(), epoch: 0, latest: None };
        Self { registry: Arc::new(Mutex::new(registry)), env }
    }

    /// Wait for the next rotation, or `timeout`, whichever comes first.
    pub fn subscribe(&self, timeout: Duration) -> Subscription<E> {
        let (tx, rx) = oneshot::channel();
        let id = self.registry.lock().expect("notifier registry poisoned").insert(tx);

        self.pending_subscription(id, rx, timeout)
    }

    /// Like [`subscribe`](Self::subscribe), but resolves at once if a
    /// rotation has happened since `epoch`.
    ///
    /// Closes the gap between reading the public key and subscribing: pass
    /// the epoch observed together with the key.
    pub fn subscribe_since(&self, epoch: u64, timeout: Duration) -> Subscription<E> {
        let (tx, rx) = oneshot::channel();

        let mut registry = self.registry.lock().expect("notifier registry poisoned");
        if registry.epoch != epoch {
            if let Some(latest) = registry.latest.clone() {
                drop(registry);
                let _ = tx.send(latest);
                return Subscription {
                    id: None,
                    rx,
                    subscribed_at: self.env.now(),
                    timeout,
                    registry: self.registry.clone(),
                    env: self.env.clone(),
                };
            }
        }
        let id = registry.insert(tx);
        drop(registry);

        self.pending_subscription(id, rx, timeout)
    }

    /// Install a new key and deliver it to every pending subscription.
    ///
    /// `install` runs under the registry lock with the new epoch, so the key
    /// swap and the drain are one step to any subscriber. Delivery happens
    /// after the lock is released; subscribers that went away are skipped.
    /// Returns how many subscriptions received the key.
    pub(crate) fn on_rotate(&self, public_key: &str, install: impl FnOnce(u64)) -> usize {
        let (epoch, waiters) = {
            let mut registry = self.registry.lock().expect("notifier registry poisoned");
            registry.epoch += 1;
            install(registry.epoch);
            registry.latest = Some(public_key.to_string());
            (registry.epoch, registry.drain())
        };

        let attempted = waiters.len();
        let delivered = waiters
            .into_iter()
            .map(|tx| tx.send(public_key.to_string()))
            .filter(Result::is_ok)
            .count();

        tracing::debug!(epoch, delivered, abandoned = attempted - delivered, "key update delivered");
        delivered
    }

    /// Rotations published so far.
    pub fn epoch(&self) -> u64 {
        self.registry.lock().expect("notifier registry poisoned").epoch
    }

    /// Subscriptions currently waiting.
    pub fn pending(&self) -> usize {
        self.registry.lock().expect("notifier registry poisoned").pending()
    }

    fn pending_subscription(
        &self,
        id: SubscriptionId,
        rx: oneshot::Receiver<String>,
        timeout: Duration,
    ) -> Subscription<E> {
        Subscription {
            id: Some(id),
            rx,
            subscribed_at: self.env.now(),
            timeout,
            registry: self.registry.clone(),
            env: self.env.clone(),
        }
    }
}

/// A pending key-update subscription.
///
/// Resolve it with [`wait`](Self::wait). The deadline is `timeout` after
/// the subscription was taken, however late `wait` is first polled.
/// Dropping it unresolved frees its slot, which is how an abandoned
/// connection cancels.
pub struct Subscription<E: Environment> {
    /// `None` once the slot is released (or if none was ever taken)
    id: Option<SubscriptionId>,
    rx: oneshot::Receiver<String>,
    subscribed_at: E::Instant,
    timeout: Duration,
    registry: Arc<Mutex<Registry>>,
    env: E,
}

impl<E: Environment> Subscription<E> {
    /// Slot handle, `None` if this subscription resolved immediately.
    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    /// Suspend until a rotation delivers a key or the deadline passes.
    pub async fn wait(mut self) -> KeyUpdate {
        let deadline = self.env.sleep(self.remaining());

        tokio::select! {
            biased;
            received = &mut self.rx => {
                self.id = None;
                return received.map_or(KeyUpdate::TimedOut, KeyUpdate::Rotated);
            }
            () = deadline => {}
        }

        if self.release() {
            return KeyUpdate::TimedOut;
        }

        // A rotation drained the slot first; its key is already on the way.
        match (&mut self.rx).await {
            Ok(key) => KeyUpdate::Rotated(key),
            Err(_) => KeyUpdate::TimedOut,
        }
    }

    /// Time left before the deadline, zero once it has passed.
    fn remaining(&self) -> Duration {
        let elapsed = self.env.now() - self.subscribed_at;
        self.timeout.saturating_sub(elapsed)
    }

    /// Empty this subscription's slot. True if it was still pending.
    fn release(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };
        self.registry.lock().expect("notifier registry poisoned").remove(id)
    }
}

impl<E: Environment> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            if let Ok(mut registry) = self.registry.lock() {
                registry.remove(id);
            }
        }
    }
}

impl<E: Environment> std::fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
