//! Record store abstraction.
//!
//! The authorizer and the one-time codes only ever touch one logical row per
//! owner, reading and writing single string fields. The business schema
//! behind that row is somebody else's concern; this trait is the whole
//! surface they need. Synchronous, like the rest of the server's storage.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticRecordStore;
pub use error::StorageError;
pub use memory::MemoryRecordStore;

pub use self::redb::RedbRecordStore;

/// Field holding the fingerprint of an owner's privileged session key.
pub const ADMIN_FINGERPRINT_FIELD: &str = "admin_key_fingerprint";

/// Field holding an owner's outstanding one-time code (empty when none).
pub const ONE_TIME_CODE_FIELD: &str = "one_time_code";

/// Field set once a one-time code has been redeemed, cleared when consumed.
pub const REDEEMED_FIELD: &str = "one_time_code_redeemed";

/// Keyed record store consumed by the authorizer and one-time codes.
///
/// Must be Clone (shared by several components), Send + Sync, and
/// synchronous. Implementations share internal state via Arc, so clones see
/// the same records.
///
/// # Panics
///
/// In-memory implementations may panic if an internal mutex is poisoned.
pub trait RecordStore: Clone + Send + Sync + 'static {
    /// Read one field of the owner's row.
    ///
    /// `None` if the owner or the field was never written.
    fn get(&self, owner: &str, field: &str) -> Result<Option<String>, StorageError>;

    /// Write one field of the owner's row, creating the row if needed.
    ///
    /// Overwrites any previous value. Writing `""` is how fields are
    /// cleared; it is distinct from never having been written.
    fn set(&self, owner: &str, field: &str, value: &str) -> Result<(), StorageError>;
}
