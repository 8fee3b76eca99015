use digest::Digest;

use crate::oid::ID_LEN;
use crate::{HashError, ObjectId};

/// Streaming SHA-1 computation with collision detection.
///
/// Data is fed incrementally with [`update`](Hasher::update) or through
/// the [`std::io::Write`] implementation, then finalised into an
/// [`ObjectId`].
pub struct Hasher {
    inner: Box<sha1_checked::Sha1>,
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            inner: Box::new(sha1_checked::Sha1::new()),
        }
    }

    /// Feed data into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalize and return the id.
    ///
    /// Fails if SHA-1 collision detection fires.
    pub fn finalize(self) -> Result<ObjectId, HashError> {
        let result = self.inner.try_finalize();
        if result.has_collision() {
            return Err(HashError::Sha1Collision);
        }
        let mut bytes = [0u8; ID_LEN];
        bytes.copy_from_slice(result.hash().as_slice());
        Ok(ObjectId::from(bytes))
    }

    /// Hash a byte slice in one call.
    pub fn digest(data: &[u8]) -> Result<ObjectId, HashError> {
        let mut h = Self::new();
        h.update(data);
        h.finalize()
    }

    /// Hash an object: `"<type> <len>\0<payload>"`.
    ///
    /// `kind` is the textual type tag (`b"blob"`, `b"commit"`, ...); the
    /// length is the payload's actual byte count.
    pub fn hash_object(kind: &[u8], payload: &[u8]) -> Result<ObjectId, HashError> {
        let mut h = Self::new();
        h.update(kind);
        h.update(b" ");
        h.update(payload.len().to_string().as_bytes());
        h.update(b"\0");
        h.update(payload);
        h.finalize()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::io::Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_digest_matches_sha1() {
        let id = Hasher::digest(b"").unwrap();
        assert_eq!(id.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn incremental_equals_one_shot() {
        let mut h = Hasher::new();
        h.update(b"hello ");
        h.update(b"world");
        assert_eq!(h.finalize().unwrap(), Hasher::digest(b"hello world").unwrap());
    }

    #[test]
    fn hash_object_matches_git() {
        // `echo -n "test content" | git hash-object --stdin`
        let id = Hasher::hash_object(b"blob", b"test content").unwrap();
        assert_eq!(id.to_hex(), "d670460b4b4aece5915caf5c68d12f560a9fe3e4");
    }

    #[test]
    fn empty_blob_matches_git() {
        let id = Hasher::hash_object(b"blob", b"").unwrap();
        assert_eq!(id.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn write_impl_feeds_hasher() {
        use std::io::Write;
        let mut h = Hasher::new();
        h.write_all(b"test content").unwrap();
        assert_eq!(h.finalize().unwrap(), Hasher::digest(b"test content").unwrap());
    }
}
