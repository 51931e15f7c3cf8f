//! Wire format sizes.

/// Upper bound on one encoded datagram, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Size of one big-endian `u32` field.
pub const FIELD_SIZE: usize = 4;

/// sender(4) + destination(4) + hop_count(4)
pub const HEADER_SIZE: usize = 3 * FIELD_SIZE;

/// Size of one encoded hop.
pub const HOP_SIZE: usize = FIELD_SIZE;

/// Largest hop count that still fits in [`MAX_MESSAGE_SIZE`].
pub const MAX_HOPS: usize = (MAX_MESSAGE_SIZE - HEADER_SIZE) / HOP_SIZE; // 253
