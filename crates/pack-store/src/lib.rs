//! Object model and storage traits for pack decoding.
//!
//! The decoder hands every reconstructed object to an [`ObjectStore`];
//! stores that support all-or-nothing imports additionally implement
//! [`Transactioner`]. [`MemoryStore`] is the bundled in-memory
//! implementation of both.

mod memory;
mod object;
mod store;

pub use memory::MemoryStore;
pub use object::{MemoryObject, ObjectWriter, PackObject};
pub use store::{ObjectStore, Transaction, Transactioner};

use bstr::BString;
use pack_hash::{HashError, ObjectId};

/// Errors produced by object stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object with the requested id (and type, if one was given).
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("invalid object type: {0}")]
    InvalidType(BString),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Type tag of a packed object.
///
/// The first four are the storable object types; the delta tags only
/// appear transiently while an entry is being reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Commit,
    Tree,
    Blob,
    Tag,
    OfsDelta,
    RefDelta,
}

impl ObjectType {
    /// Map a pack entry type code (1-4, 6, 7) to a type tag.
    pub fn from_pack_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Commit),
            2 => Some(Self::Tree),
            3 => Some(Self::Blob),
            4 => Some(Self::Tag),
            6 => Some(Self::OfsDelta),
            7 => Some(Self::RefDelta),
            _ => None,
        }
    }

    /// The type code used in pack entry headers.
    pub fn pack_code(self) -> u8 {
        match self {
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Blob => 3,
            Self::Tag => 4,
            Self::OfsDelta => 6,
            Self::RefDelta => 7,
        }
    }

    pub fn is_delta(self) -> bool {
        matches!(self, Self::OfsDelta | Self::RefDelta)
    }

    /// Parse from the textual type tag.
    pub fn from_bytes(s: &[u8]) -> Result<Self, StoreError> {
        match s {
            b"commit" => Ok(Self::Commit),
            b"tree" => Ok(Self::Tree),
            b"blob" => Ok(Self::Blob),
            b"tag" => Ok(Self::Tag),
            b"ofs-delta" => Ok(Self::OfsDelta),
            b"ref-delta" => Ok(Self::RefDelta),
            _ => Err(StoreError::InvalidType(BString::from(s))),
        }
    }

    /// The canonical byte representation, as hashed into object ids.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Commit => b"commit",
            Self::Tree => b"tree",
            Self::Blob => b"blob",
            Self::Tag => b"tag",
            Self::OfsDelta => b"ofs-delta",
            Self::RefDelta => b"ref-delta",
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // as_bytes only yields ASCII tags
        f.write_str(std::str::from_utf8(self.as_bytes()).unwrap_or("unknown"))
    }
}

impl std::str::FromStr for ObjectType {
    type Err = StoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}
