//! In-memory object storage with staged transactions.

use std::cell::RefCell;
use std::collections::HashMap;

use pack_hash::ObjectId;

use crate::object::{MemoryObject, PackObject};
use crate::store::{ObjectStore, Transaction, Transactioner};
use crate::{ObjectType, StoreError};

/// A heap-backed [`ObjectStore`] with transaction support.
///
/// Objects live in a single map keyed by id. Decoding is single-threaded,
/// so interior mutability is a `RefCell`, not a lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RefCell<HashMap<ObjectId, MemoryObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.borrow().contains_key(id)
    }

    /// Store an object directly from its parts, returning its id.
    pub fn insert(&self, kind: ObjectType, data: &[u8]) -> Result<ObjectId, StoreError> {
        let obj = MemoryObject::from_parts(kind, data);
        let id = obj.id()?;
        self.objects.borrow_mut().insert(id, obj);
        Ok(id)
    }

    fn lookup(&self, kind: Option<ObjectType>, id: &ObjectId) -> Option<MemoryObject> {
        let objects = self.objects.borrow();
        let obj = objects.get(id)?;
        match kind {
            Some(k) if k != obj.object_type() => None,
            _ => Some(obj.clone()),
        }
    }
}

impl ObjectStore for MemoryStore {
    fn new_object(&self) -> Box<dyn PackObject> {
        Box::new(MemoryObject::new())
    }

    fn set_object(&self, obj: Box<dyn PackObject>) -> Result<ObjectId, StoreError> {
        let id = obj.id()?;
        self.objects
            .borrow_mut()
            .insert(id, MemoryObject::from_parts(obj.object_type(), obj.data()));
        Ok(id)
    }

    fn object(
        &self,
        kind: Option<ObjectType>,
        id: &ObjectId,
    ) -> Result<Box<dyn PackObject>, StoreError> {
        match self.lookup(kind, id) {
            Some(obj) => Ok(Box::new(obj)),
            None => Err(StoreError::NotFound(*id)),
        }
    }

    fn transactioner(&self) -> Option<&dyn Transactioner> {
        Some(self)
    }
}

impl Transactioner for MemoryStore {
    fn begin(&self) -> Box<dyn Transaction + '_> {
        Box::new(MemoryTransaction {
            store: self,
            staged: HashMap::new(),
        })
    }
}

/// Transaction over a [`MemoryStore`]: objects are staged privately and
/// merged into the store on commit.
struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    staged: HashMap<ObjectId, MemoryObject>,
}

impl Transaction for MemoryTransaction<'_> {
    fn set_object(&mut self, obj: Box<dyn PackObject>) -> Result<ObjectId, StoreError> {
        let id = obj.id()?;
        self.staged
            .insert(id, MemoryObject::from_parts(obj.object_type(), obj.data()));
        Ok(id)
    }

    fn object(
        &self,
        kind: Option<ObjectType>,
        id: &ObjectId,
    ) -> Result<Box<dyn PackObject>, StoreError> {
        if let Some(obj) = self.staged.get(id) {
            let matches = kind.map_or(true, |k| k == obj.object_type());
            if matches {
                return Ok(Box::new(obj.clone()));
            }
            return Err(StoreError::NotFound(*id));
        }
        // Objects persisted before the transaction stay visible; thin-pack
        // bases resolve through here.
        self.store.object(kind, id)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let mut objects = self.store.objects.borrow_mut();
        for (id, obj) in self.staged.drain() {
            objects.insert(id, obj);
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.staged.clear();
        Ok(())
    }
}
