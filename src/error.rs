use thiserror::Error;

/// Programmer-contract violations on this crate's Rust API surface.
///
/// These are distinct from [`crate::status::EncoderStatus`],
/// [`crate::status::DecoderStatus`] and [`crate::status::SegmentStatus`],
/// which describe a malformed *image* or *bitstream* and are returned as
/// plain data, not as an `Err`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("destination buffer too small: need {needed} bytes, got {got}")]
    DestinationTooSmall { needed: usize, got: usize },
    #[error("source buffer too small: need {needed} bytes, got {got}")]
    SourceTooSmall { needed: usize, got: usize },
    #[error("n_segs {0} out of range [1, MAX_SEGS]")]
    InvalidSegmentCount(u32),
    #[error("image dimensions {width}x{height} out of range")]
    InvalidDimensions { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, CodecError>;
