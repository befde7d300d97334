// src/error.rs
//! Error kinds surfaced by the decoder core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SiError {
    /// No pair of sync bytes 188 bytes apart was found.
    #[error("no MPEG-TS sync byte found")]
    NotSynchronized,

    /// Remaining bytes are shorter than the declared section length.
    #[error("truncated section: declared {declared} bytes, {available} available")]
    TruncatedSection { declared: usize, available: usize },

    /// Table ID does not belong to the family expected on this PID.
    #[error("unexpected table_id 0x{0:02X}")]
    UnexpectedTableId(u8),

    /// Computed CRC-32 differs from the stored one. Non-fatal for decoding;
    /// the section record carries `crc_ok: false` instead of this error.
    #[error("CRC-32 mismatch: computed 0x{computed:08X}, stored 0x{stored:08X}")]
    CrcMismatch { computed: u32, stored: u32 },

    /// DVB text prefix selects a character set we do not handle.
    #[error("unsupported DVB text encoding 0x{0:02X}")]
    UnsupportedEncoding(u8),

    /// A descriptor's declared length runs past its enclosing loop.
    #[error("descriptor 0x{tag:02X} overflows its loop by {excess} bytes")]
    DescriptorOverflow { tag: u8, excess: usize },
}

pub type Result<T> = std::result::Result<T, SiError>;
