//! Storage traits at the decoder's persistence seam.

use pack_hash::ObjectId;

use crate::{ObjectType, PackObject, StoreError};

/// Generic object storage.
///
/// The decoder allocates fresh handles with
/// [`new_object`](ObjectStore::new_object), persists finished objects
/// with [`set_object`](ObjectStore::set_object), and resolves thin-pack
/// delta bases with [`object`](ObjectStore::object).
pub trait ObjectStore {
    /// A fresh writable object handle.
    fn new_object(&self) -> Box<dyn PackObject>;

    /// Persist an object, returning its id.
    fn set_object(&self, obj: Box<dyn PackObject>) -> Result<ObjectId, StoreError>;

    /// Look up an object by id. With `Some(kind)` the lookup only
    /// matches objects of that type; implementations return
    /// [`StoreError::NotFound`] when id and type do not both match.
    fn object(
        &self,
        kind: Option<ObjectType>,
        id: &ObjectId,
    ) -> Result<Box<dyn PackObject>, StoreError>;

    /// Capability probe: stores that support transactional imports
    /// return themselves here.
    fn transactioner(&self) -> Option<&dyn Transactioner> {
        None
    }
}

/// Optional extension for stores with transactional write support.
pub trait Transactioner {
    /// Start a transaction. The transaction must end with a call to
    /// [`Transaction::commit`] or [`Transaction::rollback`].
    fn begin(&self) -> Box<dyn Transaction + '_>;
}

/// An in-progress storage transaction.
pub trait Transaction {
    /// Stage an object inside the transaction.
    fn set_object(&mut self, obj: Box<dyn PackObject>) -> Result<ObjectId, StoreError>;

    /// Look up an object visible to the transaction (staged objects
    /// first, then whatever the store already holds).
    fn object(
        &self,
        kind: Option<ObjectType>,
        id: &ObjectId,
    ) -> Result<Box<dyn PackObject>, StoreError>;

    /// Make all staged objects durable.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard all staged objects.
    fn rollback(&mut self) -> Result<(), StoreError>;
}
