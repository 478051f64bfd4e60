//! Alignment and big-endian decoding helpers shared by the readers.

use bytes::Buf;

use crate::error::{PacketError, Result};
use crate::types::TypeTag;

/// Everything on the wire is aligned to this many bytes.
pub(crate) const ALIGNMENT: usize = 4;

pub(crate) fn is_aligned(len: usize) -> bool {
    len % ALIGNMENT == 0
}

pub(crate) fn round_up(len: usize) -> Option<usize> {
    Some(len.checked_add(ALIGNMENT - 1)? & !(ALIGNMENT - 1))
}

/// Offset just past the padded NUL-terminated string starting at `start`.
///
/// `None` when there is no terminator, or when the padding after it would run
/// past the end of `data`.
pub(crate) fn padded_string_end(data: &[u8], start: usize) -> Option<usize> {
    let rest = data.get(start..)?;
    let nul = rest.iter().position(|&b| b == 0)?;
    let end = start.checked_add(round_up(nul + 1)?)?;
    (end <= data.len()).then_some(end)
}

/// The bytes of a NUL-terminated string, terminator excluded.
pub(crate) fn c_str(data: &[u8]) -> Option<&[u8]> {
    let nul = data.iter().position(|&b| b == 0)?;
    Some(&data[..nul])
}

pub(crate) fn read_u32(data: &[u8], err: PacketError) -> Result<u32> {
    data.get(..4).map(|mut b| b.get_u32()).ok_or(err)
}

pub(crate) fn read_u64(data: &[u8], err: PacketError) -> Result<u64> {
    data.get(..8).map(|mut b| b.get_u64()).ok_or(err)
}

const EXCEEDS: PacketError = PacketError::MalformedMessage("arguments exceed message size");

/// Wire size of the argument tagged `tag` whose payload starts at `data[0]`.
pub(crate) fn payload_size(tag: TypeTag, data: &[u8]) -> Result<usize> {
    if let Some(size) = tag.fixed_size() {
        return if size <= data.len() {
            Ok(size)
        } else {
            Err(EXCEEDS)
        };
    }

    match tag {
        TypeTag::Blob => {
            let len = read_u32(data, EXCEEDS)? as usize;
            let size = round_up(len)
                .and_then(|padded| padded.checked_add(4))
                .ok_or(EXCEEDS)?;
            if size <= data.len() {
                Ok(size)
            } else {
                Err(EXCEEDS)
            }
        }
        _ => {
            if data.is_empty() {
                return Err(EXCEEDS);
            }
            padded_string_end(data, 0).ok_or(PacketError::MalformedMessage(
                "unterminated string argument",
            ))
        }
    }
}
