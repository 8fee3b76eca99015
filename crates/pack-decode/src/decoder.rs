//! The decoding pass: header, per-object dispatch, delta recall,
//! store import, checksum finalization.

use std::collections::HashMap;

use pack_hash::ObjectId;
use pack_store::{
    MemoryObject, ObjectStore, ObjectWriter, PackObject, Transaction, Transactioner,
};

use crate::delta;
use crate::index::Index;
use crate::scanner::{EntryKind, Scanner};
use crate::source::PackSource;
use crate::DecodeError;

/// Default ceiling on the object count a pack may declare.
pub const DEFAULT_MAX_OBJECTS: u32 = 1 << 20;

/// Decodes a pack from a [`Scanner`], optionally importing every object
/// into an [`ObjectStore`].
///
/// Delta bases are recalled either by seeking back into the pack (when
/// the source is seekable) or through the store; construction fails with
/// [`DecodeError::NonSeekable`] when neither path would be available.
/// The decoder owns the scanner for its whole lifetime.
pub struct Decoder<'a, S> {
    scanner: Scanner<S>,
    store: Option<&'a dyn ObjectStore>,
    /// Active transaction, bound for the duration of a transactional
    /// decode; recall reads go through it while it lives.
    tx: Option<Box<dyn Transaction + 'a>>,
    index: Index,
    max_objects: u32,
}

impl<'a, S> std::fmt::Debug for Decoder<'a, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("max_objects", &self.max_objects)
            .finish_non_exhaustive()
    }
}

impl<'a, S: PackSource> Decoder<'a, S> {
    pub fn new(
        scanner: Scanner<S>,
        store: Option<&'a dyn ObjectStore>,
    ) -> Result<Self, DecodeError> {
        if !scanner.is_seekable() && store.is_none() {
            return Err(DecodeError::NonSeekable);
        }
        Ok(Self {
            scanner,
            store,
            tx: None,
            index: Index::new(),
            max_objects: DEFAULT_MAX_OBJECTS,
        })
    }

    /// Override the declared-object-count ceiling.
    pub fn set_max_objects(&mut self, limit: u32) {
        self.max_objects = limit;
    }

    /// Decode the whole pack and return its trailing checksum.
    ///
    /// Reads the header, decodes exactly the declared number of objects
    /// (importing them into the store if one was given, transactionally
    /// if the store supports it), then reads the trailer.
    pub fn decode(&mut self) -> Result<ObjectId, DecodeError> {
        let (_, count) = self.scanner.header()?;
        if count > self.max_objects {
            return Err(DecodeError::MaxObjectsLimit {
                limit: self.max_objects,
                actual: count,
            });
        }

        match self.store {
            None => self.decode_objects(count)?,
            Some(store) => match store.transactioner() {
                Some(txer) => self.decode_objects_tx(count, txer)?,
                None => self.decode_objects_store(count, store)?,
            },
        }

        self.scanner.checksum()
    }

    fn decode_objects(&mut self, count: u32) -> Result<(), DecodeError> {
        for _ in 0..count {
            self.read_object()?;
        }
        Ok(())
    }

    fn decode_objects_store(
        &mut self,
        count: u32,
        store: &dyn ObjectStore,
    ) -> Result<(), DecodeError> {
        for _ in 0..count {
            let obj = self.read_object()?;
            store.set_object(obj)?;
        }
        Ok(())
    }

    fn decode_objects_tx(
        &mut self,
        count: u32,
        txer: &'a dyn Transactioner,
    ) -> Result<(), DecodeError> {
        self.tx = Some(txer.begin());
        let result = self.decode_into_transaction(count);

        let Some(mut tx) = self.tx.take() else {
            return result;
        };
        match result {
            Ok(()) => Ok(tx.commit()?),
            Err(original) => match tx.rollback() {
                Ok(()) => Err(original),
                Err(rollback) => Err(DecodeError::Rollback {
                    original: Box::new(original),
                    rollback,
                }),
            },
        }
    }

    fn decode_into_transaction(&mut self, count: u32) -> Result<(), DecodeError> {
        for _ in 0..count {
            let obj = self.read_object()?;
            if let Some(tx) = self.tx.as_mut() {
                tx.set_object(obj)?;
            }
        }
        Ok(())
    }

    /// Decode the next object at the scanner's current position.
    ///
    /// On success the object's offset, id, and CRC are recorded in the
    /// index.
    pub fn read_object(&mut self) -> Result<Box<dyn PackObject>, DecodeError> {
        let header = self.scanner.next_object_header()?;

        let mut obj = self.new_object();
        obj.set_size(header.length);
        obj.set_type(header.kind.object_type());

        let crc = match header.kind {
            EntryKind::OfsDelta { distance } => {
                self.read_ofs_delta(&mut *obj, header.offset, distance, header.length)?
            }
            EntryKind::RefDelta { reference } => {
                self.read_ref_delta(&mut *obj, &reference, header.length)?
            }
            _ => self.read_full_object(&mut *obj)?,
        };

        let id = obj.id()?;
        self.index.insert(header.offset, id, crc);
        Ok(obj)
    }

    /// Decode the single object whose entry starts at `offset`.
    ///
    /// The scanner position is saved and restored around the read, on
    /// the failure path too; a restoration error is surfaced only when
    /// the read itself succeeded.
    pub fn read_object_at(&mut self, offset: u64) -> Result<Box<dyn PackObject>, DecodeError> {
        if !self.scanner.is_seekable() {
            return Err(DecodeError::NonSeekable);
        }

        let before_jump = self.scanner.seek(offset)?;
        let result = self.read_object();
        let restored = self.scanner.seek(before_jump);

        match (result, restored) {
            (Ok(obj), Ok(_)) => Ok(obj),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), _) => Err(err),
        }
    }

    fn new_object(&self) -> Box<dyn PackObject> {
        match self.store {
            Some(store) => store.new_object(),
            None => Box::new(MemoryObject::new()),
        }
    }

    fn read_full_object(&mut self, obj: &mut dyn PackObject) -> Result<u32, DecodeError> {
        let mut writer = ObjectWriter::new(obj);
        let (_, crc) = self.scanner.next_object(&mut writer)?;
        Ok(crc)
    }

    fn read_ofs_delta(
        &mut self,
        obj: &mut dyn PackObject,
        offset: u64,
        distance: u64,
        length: u64,
    ) -> Result<u32, DecodeError> {
        let mut delta_buf = self.delta_scratch(length);
        let (_, crc) = self.scanner.next_object(&mut delta_buf)?;

        // The scanner guarantees distance ∈ (0, offset].
        let base = self.recall_by_offset(offset - distance)?;
        self.reconstruct(obj, &*base, &delta_buf)?;
        Ok(crc)
    }

    fn read_ref_delta(
        &mut self,
        obj: &mut dyn PackObject,
        reference: &ObjectId,
        length: u64,
    ) -> Result<u32, DecodeError> {
        let mut delta_buf = self.delta_scratch(length);
        let (_, crc) = self.scanner.next_object(&mut delta_buf)?;

        let base = self.recall_by_hash(reference)?;
        self.reconstruct(obj, &*base, &delta_buf)?;
        Ok(crc)
    }

    /// Scratch buffer for a delta's instruction stream, sized by the
    /// declared length.
    fn delta_scratch(&self, length: u64) -> Vec<u8> {
        Vec::with_capacity((length as usize).min(delta::MAX_PREALLOC))
    }

    /// Apply a delta to its base, leaving the reconstructed form in
    /// `obj`: the base's type, the target size, the target bytes.
    fn reconstruct(
        &self,
        obj: &mut dyn PackObject,
        base: &dyn PackObject,
        delta_buf: &[u8],
    ) -> Result<(), DecodeError> {
        let target = delta::apply_delta(base.data(), delta_buf)?;
        obj.set_type(base.object_type());
        obj.set_size(target.len() as u64);
        obj.push_data(&target);
        Ok(())
    }

    /// Locate a delta base by its absolute pack offset.
    fn recall_by_offset(&mut self, offset: u64) -> Result<Box<dyn PackObject>, DecodeError> {
        if self.scanner.is_seekable() {
            return self.read_object_at(offset);
        }
        // Valid packs place bases before dependents, so the offset was
        // indexed in an earlier iteration.
        match self.index.id_at(offset) {
            Some(id) => self.lookup_stored(&id),
            None => Err(DecodeError::PackEntryNotFound(offset)),
        }
    }

    /// Locate a delta base by id; thin packs may resolve it only
    /// through the store.
    fn recall_by_hash(&mut self, id: &ObjectId) -> Result<Box<dyn PackObject>, DecodeError> {
        if self.scanner.is_seekable() {
            if let Some(offset) = self.index.offset_of(id) {
                return self.read_object_at(offset);
            }
        }
        self.lookup_stored(id)
    }

    fn lookup_stored(&self, id: &ObjectId) -> Result<Box<dyn PackObject>, DecodeError> {
        if let Some(tx) = self.tx.as_deref() {
            return Ok(tx.object(None, id)?);
        }
        match self.store {
            Some(store) => Ok(store.object(None, id)?),
            None => Err(DecodeError::CannotRecall(*id)),
        }
    }

    /// The index built so far.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// The `id → offset` view of the index.
    pub fn offsets(&self) -> &HashMap<ObjectId, u64> {
        self.index.offsets()
    }

    /// The `id → crc32` view of the index.
    pub fn crcs(&self) -> &HashMap<ObjectId, u32> {
        self.index.crcs()
    }

    /// Inject a known pack layout for random-access reads without a
    /// full decode pass. Replaces only the `id → offset` direction.
    pub fn set_offsets(&mut self, offsets: HashMap<ObjectId, u64>) {
        self.index.set_offsets(offsets);
    }

    /// Close the decoder, draining whatever the scanner still holds.
    pub fn close(&mut self) -> Result<u64, DecodeError> {
        self.scanner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use pack_store::MemoryStore;
    use std::io::Cursor;

    #[test]
    fn non_seekable_without_store_is_rejected() {
        let scanner = Scanner::from_stream(Cursor::new(Vec::new()));
        let err = Decoder::new(scanner, None).unwrap_err();
        assert!(matches!(err, DecodeError::NonSeekable));
    }

    #[test]
    fn non_seekable_with_store_is_accepted() {
        let store = MemoryStore::new();
        let scanner = Scanner::from_stream(Cursor::new(Vec::new()));
        let mut decoder = Decoder::new(scanner, Some(&store)).unwrap();
        assert!(matches!(
            decoder.read_object_at(0).unwrap_err(),
            DecodeError::NonSeekable
        ));
    }

    #[test]
    fn seekable_without_store_is_accepted() {
        let scanner = Scanner::from_seekable(Cursor::new(Vec::new()));
        assert!(Decoder::new(scanner, None).is_ok());
    }
}
