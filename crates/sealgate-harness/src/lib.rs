//! Deterministic simulation harness for Sealgate protocol testing.
//!
//! Provides a seeded [`Environment`](sealgate_core::Environment) whose clock
//! is tokio's (pausable) clock, and a [`SimClient`] that plays the client
//! half of the hybrid protocol: wrapping a fresh symmetric key under the
//! server's public key, sealing the marker and payload fields, and opening
//! sealed responses.
//!
//! Same seed, same keys, same codes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_client;
pub mod sim_env;

pub use sim_client::SimClient;
pub use sim_env::SimEnv;
