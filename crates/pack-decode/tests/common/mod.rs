//! Shared fixture: build a minimal valid pack in memory.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pack_decode::delta::{encode_copy, encode_insert, write_varint};
use pack_hash::{Hasher, ObjectId};
use pack_store::ObjectType;

pub enum Entry {
    Full(ObjectType, Vec<u8>),
    /// Delta against an earlier entry of this pack, by index.
    OfsDelta { base_index: usize, delta: Vec<u8> },
    /// Delta against a base named by id (thin pack if not in the pack).
    RefDelta { reference: ObjectId, delta: Vec<u8> },
}

pub struct BuiltPack {
    pub bytes: Vec<u8>,
    /// Entry offsets, in pack order.
    pub offsets: Vec<u64>,
    /// CRC-32 of each entry's raw bytes, in pack order.
    pub crcs: Vec<u32>,
    pub checksum: ObjectId,
}

pub fn build_pack(entries: &[Entry]) -> BuiltPack {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"PACK");
    bytes.extend_from_slice(&2u32.to_be_bytes());
    bytes.extend_from_slice(&(entries.len() as u32).to_be_bytes());

    let mut offsets: Vec<u64> = Vec::new();
    let mut crcs = Vec::new();

    for entry in entries {
        let offset = bytes.len() as u64;
        offsets.push(offset);

        let mut raw = Vec::new();
        match entry {
            Entry::Full(kind, content) => {
                raw.extend_from_slice(&encode_entry_header(
                    kind.pack_code(),
                    content.len() as u64,
                ));
                raw.extend_from_slice(&compress(content));
            }
            Entry::OfsDelta { base_index, delta } => {
                raw.extend_from_slice(&encode_entry_header(
                    ObjectType::OfsDelta.pack_code(),
                    delta.len() as u64,
                ));
                raw.extend_from_slice(&encode_base_distance(offset - offsets[*base_index]));
                raw.extend_from_slice(&compress(delta));
            }
            Entry::RefDelta { reference, delta } => {
                raw.extend_from_slice(&encode_entry_header(
                    ObjectType::RefDelta.pack_code(),
                    delta.len() as u64,
                ));
                raw.extend_from_slice(reference.as_bytes());
                raw.extend_from_slice(&compress(delta));
            }
        }

        let mut crc = crc32fast::Hasher::new();
        crc.update(&raw);
        crcs.push(crc.finalize());
        bytes.extend_from_slice(&raw);
    }

    let checksum = Hasher::digest(&bytes).unwrap();
    bytes.extend_from_slice(checksum.as_bytes());

    BuiltPack {
        bytes,
        offsets,
        crcs,
        checksum,
    }
}

/// Entry header: type code in bits 6-4 of the first byte, size as a
/// little-endian varint starting with the low nibble.
pub fn encode_entry_header(code: u8, size: u64) -> Vec<u8> {
    let mut out = Vec::new();
    let mut size = size;
    let mut byte = (code << 4) | (size & 0x0f) as u8;
    size >>= 4;
    while size > 0 {
        out.push(byte | 0x80);
        byte = (size & 0x7f) as u8;
        size >>= 7;
    }
    out.push(byte);
    out
}

/// OfsDelta backwards distance, big-endian base-128 with the offset-1
/// bias on continuation bytes.
pub fn encode_base_distance(distance: u64) -> Vec<u8> {
    let mut out = Vec::new();
    let mut d = distance;
    out.push((d & 0x7f) as u8);
    d >>= 7;
    while d > 0 {
        d -= 1;
        out.push(0x80 | (d & 0x7f) as u8);
        d >>= 7;
    }
    out.reverse();
    out
}

pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Delta that copies the first `copy_len` bytes of `base` and appends
/// `suffix`.
pub fn delta_copy_insert(base: &[u8], copy_len: usize, suffix: &[u8]) -> Vec<u8> {
    let mut delta = write_varint(base.len());
    delta.extend_from_slice(&write_varint(copy_len + suffix.len()));
    if copy_len > 0 {
        delta.extend_from_slice(&encode_copy(0, copy_len));
    }
    if !suffix.is_empty() {
        delta.extend_from_slice(&encode_insert(suffix));
    }
    delta
}

pub fn blob_id(content: &[u8]) -> ObjectId {
    Hasher::hash_object(b"blob", content).unwrap()
}
