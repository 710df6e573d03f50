//! Sealgate protocol core.
//!
//! Sans-IO logic for the hybrid session protocol: recovering a per-request
//! symmetric key from an RSA ciphertext, proving it with the marker, and
//! opening or sealing payload fields. Nothing here owns a clock, a socket or
//! a keypair; callers pass the live keypair in and drive time through
//! [`Environment`].
//!
//! # Request Flow
//!
//! ```text
//! HybridRequest
//!     │  key_ciphertext ──► HybridSession::recover ──► KeyRecovery?
//!     │  verify_ciphertext ─► HybridSession::verify ──► KeyVerification?
//!     ▼
//! VerifiedSession ──► open(field) / seal(response) / fingerprint()
//! ```
//!
//! The two key failures map to the same [`Rejection::KeyRejected`] so a
//! caller cannot tell which stage refused it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
mod error;
mod request;
mod session;

pub use env::{EnvRng, Environment};
pub use error::{Rejection, SessionError};
pub use request::{DEFAULT_MARKER, HybridRequest, OpenedRequest, ProtocolConfig};
pub use session::{HybridSession, VerifiedSession};
