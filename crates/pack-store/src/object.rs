//! The object handle the decoder fills while reading a pack.

use pack_hash::{HashError, Hasher, ObjectId};

use crate::ObjectType;

/// A mutable, typed byte payload being decoded from a pack.
///
/// Stores allocate these via [`crate::ObjectStore::new_object`] so
/// custom backends can keep their own representation. The decoder sets
/// the declared size and type from the entry header, streams the
/// payload in, and for deltas overwrites both with the reconstructed
/// form before computing the id.
pub trait PackObject: std::fmt::Debug {
    fn object_type(&self) -> ObjectType;

    fn set_type(&mut self, kind: ObjectType);

    /// Declared payload size. May differ from `data().len()` until the
    /// payload has been fully written.
    fn size(&self) -> u64;

    fn set_size(&mut self, size: u64);

    /// The payload bytes written so far.
    fn data(&self) -> &[u8];

    /// Append payload bytes.
    fn push_data(&mut self, bytes: &[u8]);

    /// The content hash: `"<type> <len>\0<payload>"` over the current
    /// type and payload.
    fn id(&self) -> Result<ObjectId, HashError> {
        Hasher::hash_object(self.object_type().as_bytes(), self.data())
    }
}

/// `io::Write` adapter over a [`PackObject`] payload, for streaming
/// decompressed bodies straight into an object.
pub struct ObjectWriter<'a> {
    obj: &'a mut dyn PackObject,
}

impl<'a> ObjectWriter<'a> {
    pub fn new(obj: &'a mut dyn PackObject) -> Self {
        Self { obj }
    }
}

impl std::io::Write for ObjectWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.obj.push_data(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// The default heap-backed object.
#[derive(Debug, Clone)]
pub struct MemoryObject {
    kind: ObjectType,
    size: u64,
    data: Vec<u8>,
}

impl MemoryObject {
    /// An empty object. The type defaults to `Blob` until the caller
    /// sets it.
    pub fn new() -> Self {
        Self {
            kind: ObjectType::Blob,
            size: 0,
            data: Vec::new(),
        }
    }

    pub fn from_parts(kind: ObjectType, data: &[u8]) -> Self {
        Self {
            kind,
            size: data.len() as u64,
            data: data.to_vec(),
        }
    }
}

impl Default for MemoryObject {
    fn default() -> Self {
        Self::new()
    }
}

impl PackObject for MemoryObject {
    fn object_type(&self) -> ObjectType {
        self.kind
    }

    fn set_type(&mut self, kind: ObjectType) {
        self.kind = kind;
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn push_data(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
}
