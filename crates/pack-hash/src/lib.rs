//! Object identity for pack decoding.
//!
//! Provides the 20-byte [`ObjectId`] that names every object in a pack,
//! the hex codec used for its textual form, and the streaming [`Hasher`]
//! that derives an id from an object's type, length, and payload.

mod error;
mod hasher;
pub mod hex;
mod oid;

pub use error::HashError;
pub use hasher::Hasher;
pub use oid::ObjectId;
