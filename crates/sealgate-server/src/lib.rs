//! Sealgate server.
//!
//! Tokio glue around [`sealgate_core`]: the live RSA keypair and its
//! scheduled rotation, long-poll key-update subscriptions, privilege checks
//! by session-key fingerprint, and expiring one-time codes, all behind a
//! transport-agnostic [`Gateway`].
//!
//! # Components
//!
//! - [`KeyRing`]: owns the single live keypair, rotates it
//! - [`UpdateNotifier`]: pending subscriptions, drained on rotation
//! - [`AdministratorAuthorizer`]: fingerprint-based privilege
//! - [`OneTimeCodes`]: six-digit codes with per-owner expiry timers
//! - [`RecordStore`]: the per-owner row the last two read and write
//! - [`SystemEnv`]: production environment (real time, OS RNG)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod authorizer;
mod config;
mod error;
mod gateway;
mod keyring;
pub mod notifier;
mod one_time_code;
pub mod storage;
mod system_env;

pub use authorizer::AdministratorAuthorizer;
pub use config::{MIN_KEY_BITS, ServerConfig};
pub use error::ServerError;
pub use gateway::Gateway;
pub use keyring::{KeyGenerator, KeyRing, KeyRingError, RsaGenerator};
pub use notifier::{KeyUpdate, Subscription, SubscriptionId, UpdateNotifier};
pub use one_time_code::OneTimeCodes;
pub use storage::{
    ChaoticRecordStore, MemoryRecordStore, RecordStore, RedbRecordStore, StorageError,
};
pub use system_env::SystemEnv;
