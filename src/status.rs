//! Bitmask status flags returned by [`crate::encoder::compress`] and
//! [`crate::decoder::decompress`]. These describe data-level problems with
//! the image or bitstream, not API misuse — see [`crate::error::CodecError`]
//! for the latter.

use bitflags::bitflags;

bitflags! {
    /// Top-level flags set by the encoder driver.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EncoderStatus: u32 {
        const OK = 0;
        const BIG_WIDTH = 0x2;
        const BIG_HEIGHT = 0x4;
        const BAD_SPACE_WIDTH = 0x8;
        const SMALL_WIDTH = 0x20;
        const SMALL_HEIGHT = 0x40;
        const SMALL_IMAGE = 0x80;
        const BAD_N_SEGS = 0x100;
        const BAD_BIT_DEPTH = 0x200;
        const SMALL_BUFFER = 0x400;
        const BUFFER_FILLED = 0x2000;
        const ABORT = 0x8000_0000;
    }
}

bitflags! {
    /// Top-level flags set by the decoder driver.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DecoderStatus: u32 {
        const OK = 0;
        const BAD_NUM_DATA_SEG = 0x01;
        const NO_GOOD_SEGMENTS = 0x02;
        const BUF_TOO_SMALL = 0x04;
    }
}

bitflags! {
    /// Per-segment soft-error flags set by the decoder driver.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SegmentStatus: u32 {
        const OK = 0;
        const SHORT_DATA_SEG = 0x0001;
        const INCONSISTENT_DATA = 0x0002;
        const DUPLICATE_SEG = 0x0004;
        const BAD_DATA = 0x0020;
        const BAD_HEADER_CODE = 0x0040;
        const MISSING_DATA = 0x0080;
    }
}
