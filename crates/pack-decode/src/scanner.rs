//! Framing of the raw pack stream.
//!
//! The scanner owns the byte source and yields the pack header, one
//! entry header + zlib-decompressed body per object, and the trailing
//! checksum. It tracks the absolute stream position (entry offsets are
//! keys for delta resolution) and a CRC-32 over each entry's raw bytes:
//! the variable-length header, the base reference if any, and the
//! compressed payload.

use std::io::{self, BufRead, BufReader, Read, Write};

use flate2::bufread::ZlibDecoder;
use pack_hash::ObjectId;
use pack_store::ObjectType;

use crate::source::{PackSource, SeekSource, StreamSource};
use crate::{DecodeError, PACK_HEADER_SIZE, PACK_SIGNATURE, PACK_VERSION};

/// Type and base reference of a single pack entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Commit,
    Tree,
    Blob,
    Tag,
    /// Delta whose base lies `distance` bytes before this entry.
    OfsDelta { distance: u64 },
    /// Delta whose base is named by id, possibly outside the pack.
    RefDelta { reference: ObjectId },
}

impl EntryKind {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Commit => ObjectType::Commit,
            Self::Tree => ObjectType::Tree,
            Self::Blob => ObjectType::Blob,
            Self::Tag => ObjectType::Tag,
            Self::OfsDelta { .. } => ObjectType::OfsDelta,
            Self::RefDelta { .. } => ObjectType::RefDelta,
        }
    }

    pub fn is_delta(&self) -> bool {
        self.object_type().is_delta()
    }
}

/// Header of a single pack entry.
#[derive(Debug, Clone, Copy)]
pub struct ObjectHeader {
    pub kind: EntryKind,
    /// Absolute byte offset of the entry in the pack.
    pub offset: u64,
    /// Declared uncompressed payload size.
    pub length: u64,
}

/// Reads a pack from a [`PackSource`].
///
/// `header`, then `next_object_header`/`next_object` in pairs, then
/// `checksum`. With a seekable source, `seek` repositions the scanner
/// for random-access reads.
pub struct Scanner<S> {
    reader: BufReader<S>,
    position: u64,
    crc: crc32fast::Hasher,
    seekable: bool,
}

impl<R: Read + io::Seek> Scanner<SeekSource<R>> {
    /// Scanner over a random-access reader.
    pub fn from_seekable(reader: R) -> Self {
        Self::new(SeekSource::new(reader))
    }
}

impl<R: Read> Scanner<StreamSource<R>> {
    /// Scanner over a forward-only reader.
    pub fn from_stream(reader: R) -> Self {
        Self::new(StreamSource::new(reader))
    }
}

impl<S: PackSource> Scanner<S> {
    pub fn new(source: S) -> Self {
        let seekable = source.is_seekable();
        Self {
            reader: BufReader::new(source),
            position: 0,
            crc: crc32fast::Hasher::new(),
            seekable,
        }
    }

    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    /// Absolute offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the pack header, returning `(version, object_count)`.
    pub fn header(&mut self) -> Result<(u32, u32), DecodeError> {
        let mut buf = [0u8; PACK_HEADER_SIZE];
        self.reader.read_exact(&mut buf)?;
        self.position += buf.len() as u64;

        if &buf[0..4] != PACK_SIGNATURE {
            return Err(DecodeError::InvalidHeader("bad PACK signature".into()));
        }
        let version = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if version != PACK_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let count = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        Ok((version, count))
    }

    /// Read the next entry header.
    ///
    /// Resets the per-entry CRC; the header bytes read here are its
    /// first input.
    pub fn next_object_header(&mut self) -> Result<ObjectHeader, DecodeError> {
        self.crc.reset();
        let offset = self.position;

        // First byte: bits 6-4 = type code, bits 3-0 = low size bits.
        let mut byte = self.read_byte()?;
        let code = (byte >> 4) & 0x07;
        let mut length = (byte & 0x0f) as u64;
        let mut shift = 4;
        while byte & 0x80 != 0 {
            byte = self.read_byte()?;
            length |= ((byte & 0x7f) as u64) << shift;
            shift += 7;
        }

        let kind = match ObjectType::from_pack_code(code) {
            Some(ObjectType::Commit) => EntryKind::Commit,
            Some(ObjectType::Tree) => EntryKind::Tree,
            Some(ObjectType::Blob) => EntryKind::Blob,
            Some(ObjectType::Tag) => EntryKind::Tag,
            Some(ObjectType::OfsDelta) => EntryKind::OfsDelta {
                distance: self.read_base_distance(offset)?,
            },
            Some(ObjectType::RefDelta) => {
                let mut id = [0u8; 20];
                self.read_exact_crc(&mut id)?;
                EntryKind::RefDelta {
                    reference: ObjectId::from(id),
                }
            }
            None => return Err(DecodeError::InvalidObject(code)),
        };

        Ok(ObjectHeader {
            kind,
            offset,
            length,
        })
    }

    /// Stream the next entry's decompressed body into `writer`.
    ///
    /// Returns `(bytes_written, crc32)`; the CRC covers the raw entry
    /// bytes starting at its header.
    pub fn next_object<W: Write + ?Sized>(
        &mut self,
        writer: &mut W,
    ) -> Result<(u64, u32), DecodeError> {
        let (written, consumed) = {
            let mut decoder = ZlibDecoder::new(CrcTap {
                inner: &mut self.reader,
                crc: &mut self.crc,
            });
            let written = io::copy(&mut decoder, writer).map_err(DecodeError::Zlib)?;
            (written, decoder.total_in())
        };
        self.position += consumed;
        Ok((written, self.crc.clone().finalize()))
    }

    /// Reposition the scanner at an absolute offset, returning the
    /// prior position.
    pub fn seek(&mut self, offset: u64) -> Result<u64, DecodeError> {
        if !self.seekable {
            return Err(DecodeError::NonSeekable);
        }
        let prior = self.position;
        let buffered = self.reader.buffer().len();
        self.reader.consume(buffered);
        self.reader.get_mut().seek_to(offset)?;
        self.position = offset;
        Ok(prior)
    }

    /// Read the trailing pack checksum.
    pub fn checksum(&mut self) -> Result<ObjectId, DecodeError> {
        let mut bytes = [0u8; 20];
        self.reader.read_exact(&mut bytes)?;
        self.position += bytes.len() as u64;
        Ok(ObjectId::from(bytes))
    }

    /// Drain whatever the source still holds, returning the byte count.
    pub fn close(&mut self) -> Result<u64, DecodeError> {
        let drained = io::copy(&mut self.reader, &mut io::sink())?;
        self.position += drained;
        Ok(drained)
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf)?;
        self.position += 1;
        self.crc.update(&buf);
        Ok(buf[0])
    }

    fn read_exact_crc(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        self.reader.read_exact(buf)?;
        self.position += buf.len() as u64;
        self.crc.update(buf);
        Ok(())
    }

    /// Decode the variable-length backwards distance of an OfsDelta.
    ///
    /// A base must lie strictly before its dependent and inside the
    /// pack, so a distance of zero or one reaching past the entry's own
    /// offset is corrupt.
    fn read_base_distance(&mut self, entry_offset: u64) -> Result<u64, DecodeError> {
        let mut byte = self.read_byte()?;
        let mut distance = (byte & 0x7f) as u64;
        while byte & 0x80 != 0 {
            byte = self.read_byte()?;
            distance = ((distance + 1) << 7) | (byte & 0x7f) as u64;
        }
        if distance == 0 || distance > entry_offset {
            return Err(DecodeError::CorruptEntry(entry_offset));
        }
        Ok(distance)
    }
}

/// `BufRead` shim that feeds every consumed byte into the entry CRC.
///
/// The zlib decoder pulls from this, so compressed payload bytes join
/// the CRC exactly as they leave the source, and the scanner can charge
/// `total_in` to its position afterwards.
struct CrcTap<'a, R: BufRead> {
    inner: &'a mut R,
    crc: &'a mut crc32fast::Hasher,
}

impl<R: BufRead> Read for CrcTap<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.crc.update(&buf[..n]);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for CrcTap<'_, R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if amt > 0 {
            if let Ok(buf) = self.inner.fill_buf() {
                self.crc.update(&buf[..amt.min(buf.len())]);
            }
        }
        self.inner.consume(amt);
    }
}
