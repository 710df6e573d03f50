use std::fmt;

/// Record store failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend I/O failure (file, transaction, table).
    ///
    /// Usually transient. The request that hit it fails; nothing else does.
    Io(String),

    /// The owner has no row at all.
    ///
    /// Stores that create rows on demand never return this.
    NotFound(String),

    /// Failure injected by [`ChaoticRecordStore`](super::ChaoticRecordStore).
    Injected,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "storage I/O error: {msg}"),
            Self::NotFound(owner) => write!(f, "no record for owner {owner}"),
            Self::Injected => write!(f, "injected storage failure"),
        }
    }
}

impl std::error::Error for StorageError {}
