//! Path record wire format.
//!
//! One record per datagram, all fields big-endian `u32`:
//!
//! ```text
//! sender(4) | destination(4) | hop_count(4) | hop(4) * hop_count
//! ```
//!
//! The encoded size never exceeds [`MAX_MESSAGE_SIZE`]; oversize records are
//! rejected rather than truncated.

use crate::constants::{FIELD_SIZE, HEADER_SIZE, HOP_SIZE, MAX_HOPS, MAX_MESSAGE_SIZE};
use crate::error::CodecError;
use crate::types::{NodeId, Path, PathRecord};

/// Size in bytes of the encoding of `record`.
#[must_use]
pub fn encoded_len(record: &PathRecord) -> usize {
    HEADER_SIZE + record.path.hops() * HOP_SIZE
}

/// Serialize `record` as advertised by `sender`.
pub fn encode_record(record: &PathRecord, sender: NodeId) -> Result<Vec<u8>, CodecError> {
    let size = encoded_len(record);
    if size > MAX_MESSAGE_SIZE {
        return Err(CodecError::Format {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(&sender.0.to_be_bytes());
    out.extend_from_slice(&record.destination.0.to_be_bytes());
    // Bounded by MAX_HOPS after the size check above.
    out.extend_from_slice(&(record.path.hops() as u32).to_be_bytes());
    for hop in record.path.iter() {
        out.extend_from_slice(&hop.0.to_be_bytes());
    }
    Ok(out)
}

/// Parse one datagram into the sender id and the record it carries.
///
/// A buffer shorter than its declared hop count is `Truncated`, checked
/// before the `MAX_HOPS` limit, so only a complete oversize datagram is
/// `Malformed`.
pub fn decode_record(raw: &[u8]) -> Result<(NodeId, PathRecord), CodecError> {
    if raw.len() < HEADER_SIZE {
        return Err(CodecError::Truncated {
            expected: HEADER_SIZE,
            actual: raw.len(),
        });
    }

    let sender = NodeId(read_u32(raw, 0));
    let destination = NodeId(read_u32(raw, FIELD_SIZE));
    let hop_count = read_u32(raw, 2 * FIELD_SIZE) as usize;

    let expected = hop_count
        .checked_mul(HOP_SIZE)
        .and_then(|body| body.checked_add(HEADER_SIZE))
        .unwrap_or(usize::MAX);
    if raw.len() < expected {
        return Err(CodecError::Truncated {
            expected,
            actual: raw.len(),
        });
    }
    if hop_count > MAX_HOPS {
        return Err(CodecError::Malformed("hop count exceeds message size limit"));
    }
    if raw.len() > expected {
        return Err(CodecError::Malformed("trailing bytes after hops"));
    }

    let path: Path = raw[HEADER_SIZE..expected]
        .chunks_exact(HOP_SIZE)
        .map(|chunk| NodeId(read_u32(chunk, 0)))
        .collect();

    Ok((sender, PathRecord { destination, path }))
}

fn read_u32(raw: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; FIELD_SIZE];
    buf.copy_from_slice(&raw[at..at + FIELD_SIZE]);
    u32::from_be_bytes(buf)
}
