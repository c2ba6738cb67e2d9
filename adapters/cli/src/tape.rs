//! Recorded input tapes: one [`FrameInput::encode_byte`] per simulation tick.

use gravitation_core::FrameInput;
use thiserror::Error;

const RESERVED_BITS: u8 = 0xe0;

/// Reasons a byte buffer is not a valid input tape.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub(crate) enum TapeError {
    /// The tape holds no frames.
    #[error("input tape is empty")]
    Empty,
    /// A frame sets bits that do not map to any input.
    #[error("reserved bits set in frame {frame}: {byte:#04x}")]
    ReservedBitsSet {
        /// Index of the offending frame.
        frame: usize,
        /// Raw byte of the frame.
        byte: u8,
    },
}

/// Validates `bytes` and decodes every frame.
pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<FrameInput>, TapeError> {
    if bytes.is_empty() {
        return Err(TapeError::Empty);
    }

    bytes
        .iter()
        .enumerate()
        .map(|(frame, &byte)| {
            if byte & RESERVED_BITS != 0 {
                return Err(TapeError::ReservedBitsSet { frame, byte });
            }
            Ok(FrameInput::decode_byte(byte))
        })
        .collect()
}
