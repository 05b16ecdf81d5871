//! Custom error types for the morphy-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// A word that is simply not in the dictionary is never an error: lookups
/// return `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum MorphyError {
    /// An error originating from the byte store.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The file is structurally invalid (bad magic, truncated header, section out of bounds).
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The version field of a dictionary file is not the one this reader understands.
    #[error("Unsupported {what} version: {version}. Only version 2 is supported.")]
    UnsupportedVersion { what: &'static str, version: u32 },

    /// The file uses a feature this reader does not implement (hash automata, big-endian, ...).
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An annotation blob whose length is not a positive multiple of the record size.
    #[error("Invalid annotation of {len} bytes (record size is {record_size})")]
    MalformedAnnotation { len: usize, record_size: usize },

    /// A grammatical-information entry is out of bounds or internally inconsistent.
    #[error("Malformed graminfo data: {0}")]
    MalformedData(String),

    /// An ancode missing from the gramtab index, meaning gramtab and
    /// dictionary do not belong together.
    #[error("Unknown ancode {0:02x?} in gramtab")]
    UnknownAncode(Vec<u8>),

    /// The gramtab blob could not be deserialized.
    #[error("Invalid gramtab: {0}")]
    GramTab(String),

    /// A mutex lock was poisoned, indicating a panic in another thread holding the lock.
    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

/// A convenience `Result` type alias using the crate's `MorphyError` type.
pub type Result<T> = std::result::Result<T, MorphyError>;
