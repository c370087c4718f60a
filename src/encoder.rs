//! Encoder driver: iterates segments and pixels, wiring the context
//! engine, predictor and residual coder together. Mirrors the overall
//! pipeline shape of the teacher's `ScanEncoder::encode_regular` (predict,
//! quantize, code, update) generalized to this codec's segmented framing.

use tracing::{debug, trace};

use crate::bit_depth::BitDepth;
use crate::bitstream::BitWriter;
use crate::constants::NCONTEXTS;
use crate::context::compute_context;
use crate::image::{check_image, Image, Rectangle};
use crate::predictor::{apply_bias, predict_raw};
use crate::residual::{encode_golomb, fold, map_to_nonneg, ContextStats};
use crate::segmenter;
use crate::status::EncoderStatus;

/// Per-segment output location within the compressed byte buffer.
#[derive(Debug, Clone, Copy)]
pub struct SegmentDescriptor {
    pub start: usize,
    pub bit_len: u64,
}

#[derive(Debug, Default)]
pub struct CompressedOutput {
    pub segments: Vec<SegmentDescriptor>,
    pub compressed_size_bytes: usize,
}

fn write_header(writer: &mut BitWriter, bit_depth: BitDepth, width: u32, height: u32, n_segs: u32, seg_index: u32) {
    let header_code: u8 = bit_depth.into();
    writer.append_msb(header_code as u32, 2);
    writer.append_msb(width - 1, 12);
    writer.append_msb(height - 1, 12);
    writer.append_msb(n_segs - 1, 5);
    writer.append_msb(seg_index, 5);
}

fn encode_segment(
    writer: &mut BitWriter,
    image: &Image,
    rect: &Rectangle,
    seg_index: u32,
) {
    let bit_depth = image.bit_depth;
    write_header(writer, bit_depth, image.width, image.height, image.n_segs, seg_index);

    writer.append_msb(image.get(rect.xstart, rect.ystart) as u32, bit_depth.bits());
    writer.append_msb(image.get(rect.xstart + 1, rect.ystart) as u32, bit_depth.bits());

    let pmax = bit_depth.pmax();
    let prange = bit_depth.prange();
    let rmin = bit_depth.rmin();
    let rmax = bit_depth.rmax();
    let maxn = bit_depth.maxn();

    let mut stats = vec![ContextStats::new(bit_depth.initcc(), bit_depth.initcms()); NCONTEXTS];
    let src = |px: u32, py: u32| image.get(px, py) as i32;

    for y in rect.ystart..rect.yend {
        for x in rect.xstart..rect.xend {
            if y == rect.ystart && (x == rect.xstart || x == rect.xstart + 1) {
                continue;
            }
            if writer.filled() {
                return;
            }

            let ctx = compute_context(bit_depth, &src, rect, x, y);
            let cs = &mut stats[ctx.index];

            let raw_est = predict_raw(&src, rect, x, y);
            let est = apply_bias(raw_est, cs.bias, ctx.flip, pmax);

            let actual = image.get(x, y) as i32;
            let diff = actual - est;
            let r = fold(diff, rmin, rmax, prange);
            let r_coded = if ctx.flip { -r } else { r };

            let v = map_to_nonneg(r_coded);
            let k = cs.golomb_k();
            encode_golomb(writer, v, k);

            cs.update(r_coded, maxn);
        }
    }
}

/// Compresses `image` into `out`, tiling it into `image.n_segs` independent
/// segments. Returns the overall encoder status and the per-segment
/// location table.
pub fn compress(image: &Image, out: &mut [u8]) -> (EncoderStatus, CompressedOutput) {
    let flags = check_image(image);
    if flags.contains(EncoderStatus::ABORT) {
        debug!(?flags, "compress rejected by check_image");
        return (flags, CompressedOutput::default());
    }

    let rects = segmenter::segment(image.width, image.height, image.n_segs);
    let mut writer = BitWriter::new(out);
    let mut segments = Vec::with_capacity(rects.len());
    let mut overall = EncoderStatus::OK;

    for (i, rect) in rects.iter().enumerate() {
        let start = writer.byte_pos();
        let bits_before = writer.bits_written();
        encode_segment(&mut writer, image, rect, i as u32);
        writer.flush();
        let bit_len = writer.bits_written() - bits_before;
        trace!(segment = i, start, bit_len, "segment encoded");
        segments.push(SegmentDescriptor { start, bit_len });
        if writer.filled() {
            overall |= EncoderStatus::BUFFER_FILLED;
        }
    }

    let compressed_size_bytes = writer.byte_pos();
    debug!(compressed_size_bytes, n_segs = segments.len(), "compress complete");

    (overall, CompressedOutput { segments, compressed_size_bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_image(w: u32, h: u32, bit_depth: BitDepth, pixels: Vec<i16>) -> Image<'static> {
        Image {
            width: w,
            height: h,
            space_width: w,
            bit_depth,
            n_segs: 1,
            pixels: Box::leak(pixels.into_boxed_slice()),
        }
    }

    #[test]
    fn constant_image_compresses_small() {
        let w = 64;
        let h = 64;
        let pixels = vec![0i16; (w * h) as usize];
        let mut image = make_image(w, h, BitDepth::Eight, pixels);
        image.n_segs = 4;
        let mut buf = vec![0u8; 4096];
        let (flags, out) = compress(&image, &mut buf);
        assert_eq!(flags, EncoderStatus::OK);
        assert_eq!(out.segments.len(), 4);
        assert!(out.compressed_size_bytes < 512);
    }

    #[test]
    fn too_small_buffer_reports_buffer_filled() {
        let w = 64;
        let h = 64;
        let mut seed = 7u32;
        let mut pixels = Vec::with_capacity((w * h) as usize);
        for _ in 0..(w * h) {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            pixels.push(((seed >> 16) & 0xFF) as i16);
        }
        let mut image = make_image(w, h, BitDepth::Eight, pixels);
        image.n_segs = 2;
        let mut buf = vec![0u8; 8];
        let (flags, _out) = compress(&image, &mut buf);
        assert!(flags.contains(EncoderStatus::BUFFER_FILLED));
    }
}
