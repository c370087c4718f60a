//! Image and rectangle data types, and the caller-facing validation entry
//! point `check_image`.

use crate::bit_depth::BitDepth;
use crate::constants::{MAX_HEIGHT, MAX_SEGS, MAX_WIDTH, MIN_HEIGHT, MIN_SEGMENT_PIXELS, MIN_WIDTH};
use crate::error::{CodecError, Result};
use crate::status::EncoderStatus;

/// A read-only view over a caller-owned pixel buffer.
///
/// `space_width` is the row stride in pixels and may exceed `width` when the
/// caller's buffer includes padding columns.
#[derive(Debug, Clone, Copy)]
pub struct Image<'a> {
    pub width: u32,
    pub height: u32,
    pub space_width: u32,
    pub bit_depth: BitDepth,
    pub n_segs: u32,
    pub pixels: &'a [i16],
}

/// A writable view over a caller-owned pixel buffer, populated by
/// [`crate::decoder::decompress`].
pub struct ImageOut<'a> {
    pub width: u32,
    pub height: u32,
    pub space_width: u32,
    pub bit_depth: BitDepth,
    pub pixels: &'a mut [i16],
}

/// A rectangular sub-region of an image, in pixel coordinates, `end`
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub xstart: u32,
    pub xend: u32,
    pub ystart: u32,
    pub yend: u32,
}

impl Rectangle {
    pub fn width(&self) -> u32 {
        self.xend - self.xstart
    }

    pub fn height(&self) -> u32 {
        self.yend - self.ystart
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

impl<'a> Image<'a> {
    /// Validates construction-time contract violations that would panic on
    /// first use rather than surface as one of `check_image`'s soft status
    /// flags -- a zero width/height, an `n_segs` out of range, or a pixel
    /// buffer shorter than `space_width * height` declares.
    pub fn new(
        width: u32,
        height: u32,
        space_width: u32,
        bit_depth: BitDepth,
        n_segs: u32,
        pixels: &'a [i16],
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidDimensions { width, height });
        }
        if n_segs == 0 || n_segs as usize > MAX_SEGS {
            return Err(CodecError::InvalidSegmentCount(n_segs));
        }
        let needed = (space_width as u64) * (height as u64);
        if (pixels.len() as u64) < needed {
            return Err(CodecError::SourceTooSmall { needed: needed as usize, got: pixels.len() });
        }
        Ok(Image { width, height, space_width, bit_depth, n_segs, pixels })
    }

    pub fn row(&self, y: u32) -> &[i16] {
        let start = (y * self.space_width) as usize;
        &self.pixels[start..start + self.width as usize]
    }

    pub fn get(&self, x: u32, y: u32) -> i16 {
        self.pixels[(y * self.space_width + x) as usize]
    }
}

impl<'a> ImageOut<'a> {
    /// Validates that `pixels` is large enough to hold `space_width *
    /// height` samples before construction. The decoder's own `BUF_TOO_SMALL`
    /// status instead covers the case where a *bitstream*'s declared
    /// geometry exceeds an otherwise-valid buffer; this catches the caller
    /// passing a buffer too small for the geometry it itself declared.
    pub fn new(
        width: u32,
        height: u32,
        space_width: u32,
        bit_depth: BitDepth,
        pixels: &'a mut [i16],
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidDimensions { width, height });
        }
        let needed = (space_width as u64) * (height as u64);
        if (pixels.len() as u64) < needed {
            return Err(CodecError::DestinationTooSmall { needed: needed as usize, got: pixels.len() });
        }
        Ok(ImageOut { width, height, space_width, bit_depth, pixels })
    }

    pub fn set(&mut self, x: u32, y: u32, value: i16) {
        let idx = (y * self.space_width + x) as usize;
        self.pixels[idx] = value;
    }
}

/// Pure validation of image metadata, mirroring the encoder's own parameter
/// checks without touching the pixel buffer. Calling this repeatedly on the
/// same `Image` always returns the same flags.
pub fn check_image(image: &Image) -> EncoderStatus {
    let mut flags = EncoderStatus::OK;

    if image.width < MIN_WIDTH {
        flags |= EncoderStatus::SMALL_WIDTH;
    }
    if image.width > MAX_WIDTH {
        flags |= EncoderStatus::BIG_WIDTH;
    }
    if image.height < MIN_HEIGHT {
        flags |= EncoderStatus::SMALL_HEIGHT;
    }
    if image.height > MAX_HEIGHT {
        flags |= EncoderStatus::BIG_HEIGHT;
    }
    if image.space_width < image.width {
        flags |= EncoderStatus::BAD_SPACE_WIDTH;
    }
    if image.n_segs == 0 || image.n_segs as usize > MAX_SEGS {
        flags |= EncoderStatus::BAD_N_SEGS;
    }
    if (image.width as u64) * (image.height as u64) < (image.n_segs as u64) * MIN_SEGMENT_PIXELS as u64
    {
        flags |= EncoderStatus::SMALL_IMAGE;
    }

    let expected_len = (image.space_width as u64) * (image.height as u64);
    if (image.pixels.len() as u64) < expected_len {
        flags |= EncoderStatus::SMALL_BUFFER;
    }

    if !flags.is_empty() {
        flags |= EncoderStatus::ABORT;
    }

    flags
}
