//! Offset⇄id bookkeeping built during a decode pass.

use std::collections::HashMap;

use pack_hash::ObjectId;

/// Per-pack object index.
///
/// Three maps, written together after each successful per-object decode:
/// `offset → id`, `id → offset`, and `id → crc32`. The first two stay
/// mutual inverses except when a caller injects a layout with
/// [`set_offsets`](Index::set_offsets).
#[derive(Debug, Default)]
pub struct Index {
    offset_to_id: HashMap<u64, ObjectId>,
    id_to_offset: HashMap<ObjectId, u64>,
    crcs: HashMap<ObjectId, u32>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decoded object in all three maps.
    pub(crate) fn insert(&mut self, offset: u64, id: ObjectId, crc: u32) {
        self.offset_to_id.insert(offset, id);
        self.id_to_offset.insert(id, offset);
        self.crcs.insert(id, crc);
    }

    /// Id of the object decoded at `offset`, if any.
    pub fn id_at(&self, offset: u64) -> Option<ObjectId> {
        self.offset_to_id.get(&offset).copied()
    }

    /// Offset of the object with the given id, if known.
    pub fn offset_of(&self, id: &ObjectId) -> Option<u64> {
        self.id_to_offset.get(id).copied()
    }

    pub fn crc_of(&self, id: &ObjectId) -> Option<u32> {
        self.crcs.get(id).copied()
    }

    /// The `id → offset` view.
    pub fn offsets(&self) -> &HashMap<ObjectId, u64> {
        &self.id_to_offset
    }

    /// The `id → crc32` view.
    pub fn crcs(&self) -> &HashMap<ObjectId, u32> {
        &self.crcs
    }

    /// Replace the `id → offset` map wholesale.
    ///
    /// For callers that already know the pack layout and only want
    /// random-access reads by id. Deliberately leaves `offset → id`
    /// untouched; injected layouts are addressed by id alone.
    pub fn set_offsets(&mut self, offsets: HashMap<ObjectId, u64>) {
        self.id_to_offset = offsets;
    }

    /// Number of objects recorded by decoding.
    pub fn len(&self) -> usize {
        self.offset_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offset_to_id.is_empty()
    }
}
