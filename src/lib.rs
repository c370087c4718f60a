/*!
# locoflight

`locoflight` is a lossless grayscale image codec derived from LOCO-I (the
algorithm behind JPEG-LS), built for embedded and flight use: fixed 8- or
12-bit depth, no color, no run-length extension, and a segmented bitstream
that tolerates partial data loss. Each segment carries its own header and
resets its context statistics, so a bit error or dropped block corrupts at
most the segment it falls in rather than the whole image.

## Modules

- [`image`] — `Image`/`ImageOut`/`Rectangle` data types and `check_image`.
- [`segmenter`] — deterministic tiling of an image into `n_segs` rectangles.
- [`bitstream`] — MSB-first bit packing/unpacking over caller-owned buffers.
- [`context`] — gradient-based context derivation and the sign-flip cascade.
- [`predictor`] — the MED predictor and context-bias correction.
- [`residual`] — adaptive Golomb-Rice residual coding.
- [`encoder`] / [`decoder`] — the segment-level drivers tying the above
  together into [`encoder::compress`] and [`decoder::decompress`].
- [`status`] — the `EncoderStatus`/`DecoderStatus`/`SegmentStatus` bitmasks.
- [`error`] — [`error::CodecError`], for API-contract violations distinct
  from the status bitmasks above.
*/

pub mod bit_depth;
pub mod bitstream;
pub mod constants;
pub mod context;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod image;
pub mod predictor;
pub mod residual;
pub mod segmenter;
pub mod status;

pub use bit_depth::BitDepth;
pub use error::CodecError;
pub use image::{check_image, Image, ImageOut, Rectangle};
