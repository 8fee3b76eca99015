//! Packfile decoding.
//!
//! A pack concatenates many zlib-compressed objects behind a single
//! header and trailing checksum; some objects are stored whole, others
//! as deltas against a base named by id or by byte distance. The
//! [`Scanner`] frames the raw stream, the [`Decoder`] drives a single
//! pass over it — reconstructing deltas by seeking back into the pack or
//! by asking an external [`ObjectStore`](pack_store::ObjectStore) — and
//! the [`Index`] keeps the offset⇄id bookkeeping that makes later
//! references cheap.

pub mod delta;
mod decoder;
mod index;
mod scanner;
mod source;

pub use decoder::{Decoder, DEFAULT_MAX_OBJECTS};
pub use index::Index;
pub use scanner::{EntryKind, ObjectHeader, Scanner};
pub use source::{PackSource, SeekSource, StreamSource};

use pack_hash::{HashError, ObjectId};
use pack_store::StoreError;

/// Pack format constants.
pub const PACK_SIGNATURE: &[u8; 4] = b"PACK";
pub const PACK_VERSION: u32 = 2;
pub const PACK_HEADER_SIZE: usize = 12;

/// Errors that can occur while decoding a pack.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid pack header: {0}")]
    InvalidHeader(String),

    #[error("unsupported pack version: {0}")]
    UnsupportedVersion(u32),

    #[error("max objects limit reached: pack declares {actual}, limit is {limit}")]
    MaxObjectsLimit { limit: u32, actual: u32 },

    /// An entry carried an unknown type code.
    #[error("invalid git object: type {0}")]
    InvalidObject(u8),

    #[error("corrupt pack entry at offset {0}")]
    CorruptEntry(u64),

    /// A delta referenced an in-pack base that was never decoded.
    #[error("can't find a pack entry at offset {0}")]
    PackEntryNotFound(u64),

    #[error("zlib reading error: {0}")]
    Zlib(#[source] std::io::Error),

    /// A delta base could not be produced by any available path.
    #[error("cannot recall object {0}")]
    CannotRecall(ObjectId),

    #[error("non-seekable scanner")]
    NonSeekable,

    #[error("invalid delta at offset {offset}: {reason}")]
    InvalidDelta { offset: usize, reason: String },

    /// A transactional decode failed and the rollback failed too; both
    /// errors are carried.
    #[error("rollback error: {rollback}, during set error: {original}")]
    Rollback {
        original: Box<DecodeError>,
        rollback: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
