//! Core types, constants, and wire format for the path-vector routing engine.
//!
//! This crate defines node identifiers, hop paths, advertised path records,
//! the engine's notion of time, and the fixed-layout codec used to carry a
//! single path record per datagram.

pub mod constants;
pub mod error;
pub mod types;
pub mod wire;

pub use constants::{HEADER_SIZE, HOP_SIZE, MAX_HOPS, MAX_MESSAGE_SIZE};
pub use error::CodecError;
pub use types::{NodeId, Path, PathRecord, Timestamp};
pub use wire::{decode_record, encode_record, encoded_len};
