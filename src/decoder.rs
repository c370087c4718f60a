//! Decoder driver: reads one independent bitstream blob per segment,
//! tolerating malformed or truncated data by marking the affected segment
//! and moving on, per the "soft per-segment status, no hard abort" design
//! this codec is built around (grounded in the overall wrapper shape of
//! the teacher's `JpeglsDecoder`, though the tolerance model itself has no
//! teacher counterpart).

use tracing::{debug, warn};

use crate::bit_depth::BitDepth;
use crate::bitstream::BitReader;
use crate::constants::{
    MAX_SEGS, MAX_HEIGHT, MAX_WIDTH, MIN_HEIGHT, MIN_SEGMENT_PIXELS, MIN_WIDTH, NCONTEXTS,
};
use crate::context::compute_context;
use crate::image::{ImageOut, Rectangle};
use crate::predictor::{apply_bias, predict_raw};
use crate::residual::{decode_golomb, unmap_from_nonneg, wrap_pixel, ContextStats};
use crate::segmenter;
use crate::status::{DecoderStatus, SegmentStatus};

/// Per-input-segment decode result.
#[derive(Debug, Clone, Copy)]
pub struct SegmentResult {
    pub real_num: u32,
    pub status: SegmentStatus,
    pub first_line: u32,
    pub first_sample: u32,
    pub n_lines: u32,
    pub n_samples: u32,
    pub n_missing_pixels: u32,
}

struct Established {
    bit_depth: BitDepth,
    header_code: u8,
    width: u32,
    height: u32,
    n_segs: u32,
    rects: Vec<Rectangle>,
    decoded: Vec<bool>,
}

/// Compares a later segment's raw header fields against the already
/// established image parameters. Uses the raw `header_code` byte rather
/// than a parsed `BitDepth` so that a corrupted header_code (e.g. a
/// bit-flip landing on an invalid 2-bit value) is reported as
/// `INCONSISTENT_DATA`, not mistaken for the distinct `BAD_HEADER_CODE`
/// case that only applies while establishing image parameters.
fn header_is_consistent(e: &Established, header_code: u8, width: u32, height: u32, n_segs: u32) -> bool {
    e.header_code == header_code && e.width == width && e.height == height && e.n_segs == n_segs
}

fn dims_valid(width: u32, height: u32, n_segs: u32) -> bool {
    width >= MIN_WIDTH
        && width <= MAX_WIDTH
        && height >= MIN_HEIGHT
        && height <= MAX_HEIGHT
        && n_segs >= 1
        && n_segs as usize <= MAX_SEGS
        && (width as u64) * (height as u64) >= (n_segs as u64) * MIN_SEGMENT_PIXELS as u64
}

/// Decompresses `blobs` (one independent bitstream per segment, in
/// whatever order the caller received them) into `image_out`.
///
/// Returns the top-level decoder status and one [`SegmentResult`] per input
/// blob, in input order.
pub fn decompress(blobs: &[&[u8]], image_out: &mut ImageOut) -> (DecoderStatus, Vec<SegmentResult>) {
    if blobs.is_empty() || blobs.len() > MAX_SEGS {
        warn!(n_blobs = blobs.len(), "decompress: bad number of data segments");
        return (DecoderStatus::BAD_NUM_DATA_SEG, Vec::new());
    }

    let mut established: Option<Established> = None;
    let mut results = Vec::with_capacity(blobs.len());
    let mut buf_too_small = false;

    for blob in blobs {
        let mut reader = BitReader::new(blob, blob.len() * 8);

        let header_code = reader.read_msb(2) as u8;
        let width_m1 = reader.read_msb(12);
        let height_m1 = reader.read_msb(12);
        let n_segs_m1 = reader.read_msb(5);
        let seg_index = reader.read_msb(5);

        if reader.out_of_bits() {
            results.push(SegmentResult {
                real_num: 0,
                status: SegmentStatus::SHORT_DATA_SEG,
                first_line: 0,
                first_sample: 0,
                n_lines: 0,
                n_samples: 0,
                n_missing_pixels: 0,
            });
            continue;
        }

        let width = width_m1 + 1;
        let height = height_m1 + 1;
        let n_segs = n_segs_m1 + 1;

        if established.is_none() {
            let bit_depth = match BitDepth::try_from(header_code) {
                Ok(bd) => bd,
                Err(_) => {
                    results.push(SegmentResult {
                        real_num: seg_index,
                        status: SegmentStatus::BAD_HEADER_CODE,
                        first_line: 0,
                        first_sample: 0,
                        n_lines: 0,
                        n_samples: 0,
                        n_missing_pixels: 0,
                    });
                    continue;
                }
            };
            if !dims_valid(width, height, n_segs) {
                results.push(SegmentResult {
                    real_num: seg_index,
                    status: SegmentStatus::BAD_DATA,
                    first_line: 0,
                    first_sample: 0,
                    n_lines: 0,
                    n_samples: 0,
                    n_missing_pixels: 0,
                });
                continue;
            }
            let needed = (width as u64) * (height as u64);
            if (image_out.pixels.len() as u64) < needed {
                buf_too_small = true;
                break;
            }
            for p in image_out.pixels.iter_mut() {
                *p = 0;
            }
            image_out.width = width;
            image_out.height = height;
            image_out.space_width = width;
            image_out.bit_depth = bit_depth;
            let rects = segmenter::segment(width, height, n_segs);
            established = Some(Established {
                bit_depth,
                header_code,
                width,
                height,
                n_segs,
                rects,
                decoded: vec![false; n_segs as usize],
            });
            debug!(width, height, n_segs, "decoder established image parameters");
        } else {
            let e = established.as_ref().unwrap();
            if !header_is_consistent(e, header_code, width, height, n_segs) {
                results.push(SegmentResult {
                    real_num: seg_index,
                    status: SegmentStatus::INCONSISTENT_DATA,
                    first_line: 0,
                    first_sample: 0,
                    n_lines: 0,
                    n_samples: 0,
                    n_missing_pixels: 0,
                });
                continue;
            }
        }

        let e = established.as_mut().unwrap();
        let bit_depth = e.bit_depth;

        if seg_index >= e.n_segs {
            results.push(SegmentResult {
                real_num: seg_index,
                status: SegmentStatus::BAD_DATA,
                first_line: 0,
                first_sample: 0,
                n_lines: 0,
                n_samples: 0,
                n_missing_pixels: 0,
            });
            continue;
        }
        if e.decoded[seg_index as usize] {
            results.push(SegmentResult {
                real_num: seg_index,
                status: SegmentStatus::DUPLICATE_SEG,
                first_line: 0,
                first_sample: 0,
                n_lines: 0,
                n_samples: 0,
                n_missing_pixels: 0,
            });
            continue;
        }
        e.decoded[seg_index as usize] = true;

        let rect = e.rects[seg_index as usize];
        let total_pixels = rect.area() as u32;
        let space_width = image_out.space_width;

        let mut status = SegmentStatus::OK;
        let mut n_written = 0u32;

        let p0 = reader.read_msb(bit_depth.bits());
        if !reader.out_of_bits() {
            image_out.set(rect.xstart, rect.ystart, p0 as i16);
            n_written += 1;
        }
        let p1 = if !reader.out_of_bits() { Some(reader.read_msb(bit_depth.bits())) } else { None };
        if let Some(p1) = p1 {
            if !reader.out_of_bits() {
                image_out.set(rect.xstart + 1, rect.ystart, p1 as i16);
                n_written += 1;
            }
        }

        if reader.out_of_bits() {
            status |= SegmentStatus::MISSING_DATA;
        } else {
            let pmax = bit_depth.pmax();
            let prange = bit_depth.prange();
            let rmin = bit_depth.rmin();
            let rmax = bit_depth.rmax();
            let maxn = bit_depth.maxn();
            let mut stats = vec![ContextStats::new(bit_depth.initcc(), bit_depth.initcms()); NCONTEXTS];

            'pixels: for y in rect.ystart..rect.yend {
                for x in rect.xstart..rect.xend {
                    if y == rect.ystart && (x == rect.xstart || x == rect.xstart + 1) {
                        continue;
                    }

                    let src = |px: u32, py: u32| image_out.pixels[(py * space_width + px) as usize] as i32;
                    let ctx = compute_context(bit_depth, &src, &rect, x, y);
                    let cs = &mut stats[ctx.index];

                    let raw_est = predict_raw(&src, &rect, x, y);
                    let est = apply_bias(raw_est, cs.bias, ctx.flip, pmax);

                    let k = cs.golomb_k();
                    let v = match decode_golomb(&mut reader, k) {
                        Some(v) => v,
                        None => {
                            status |= SegmentStatus::MISSING_DATA;
                            break 'pixels;
                        }
                    };

                    let r_coded = unmap_from_nonneg(v);
                    cs.update(r_coded, maxn);

                    let r = if ctx.flip { -r_coded } else { r_coded };
                    let pixel = wrap_pixel(est + r, pmax, prange);
                    image_out.set(x, y, pixel as i16);
                    n_written += 1;
                }
            }
        }

        let n_missing_pixels = total_pixels - n_written;
        if n_missing_pixels > 0 {
            status |= SegmentStatus::MISSING_DATA;
        }

        results.push(SegmentResult {
            real_num: seg_index,
            status,
            first_line: rect.ystart,
            first_sample: rect.xstart,
            n_lines: rect.height(),
            n_samples: rect.width(),
            n_missing_pixels,
        });
    }

    if buf_too_small {
        warn!("decompress: output buffer too small for declared geometry");
        return (DecoderStatus::BUF_TOO_SMALL, results);
    }

    if established.is_none() {
        return (DecoderStatus::NO_GOOD_SEGMENTS, results);
    }

    (DecoderStatus::OK, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::compress;
    use crate::image::Image;

    fn round_trip(w: u32, h: u32, bit_depth: BitDepth, n_segs: u32, pixels: Vec<i16>) -> (Vec<i16>, Vec<SegmentResult>) {
        let image = Image { width: w, height: h, space_width: w, bit_depth, n_segs, pixels: &pixels };
        let mut buf = vec![0u8; (w as usize) * (h as usize) * 4 + 1024];
        let (enc_flags, out) = compress(&image, &mut buf);
        assert!(!enc_flags.contains(crate::status::EncoderStatus::ABORT));
        assert!(!enc_flags.contains(crate::status::EncoderStatus::BUFFER_FILLED));

        let blobs: Vec<&[u8]> = out
            .segments
            .iter()
            .map(|s| {
                let byte_len = ((s.bit_len + 7) / 8) as usize;
                &buf[s.start..s.start + byte_len]
            })
            .collect();

        let mut decoded = vec![0i16; (w as usize) * (h as usize)];
        let mut image_out = ImageOut { width: w, height: h, space_width: w, bit_depth, pixels: &mut decoded };
        let (dec_flags, results) = decompress(&blobs, &mut image_out);
        assert_eq!(dec_flags, DecoderStatus::OK);
        (decoded, results)
    }

    #[test]
    fn constant_image_round_trips_exactly() {
        let w = 32;
        let h = 32;
        let pixels = vec![0i16; (w * h) as usize];
        let (decoded, results) = round_trip(w, h, BitDepth::Eight, 4, pixels.clone());
        assert_eq!(decoded, pixels);
        for r in results {
            assert_eq!(r.status, SegmentStatus::OK);
            assert_eq!(r.n_missing_pixels, 0);
        }
    }

    #[test]
    fn constant_max_value_image_round_trips_exactly() {
        let w = 24;
        let h = 24;
        let pixels = vec![4095i16; (w * h) as usize];
        let (decoded, _) = round_trip(w, h, BitDepth::Twelve, 3, pixels.clone());
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn pseudo_random_image_round_trips_exactly() {
        let w = 48;
        let h = 48;
        let mut seed = 42u32;
        let mut pixels = Vec::with_capacity((w * h) as usize);
        for _ in 0..(w * h) {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            pixels.push(((seed >> 16) & 0xFFF) as i16);
        }
        let (decoded, _) = round_trip(w, h, BitDepth::Twelve, 6, pixels.clone());
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn bad_n_segs_header_is_rejected() {
        // Hand-craft a single-segment header with n_segs_m1 = 32 (n_segs = 33).
        let mut buf = [0u8; 8];
        {
            use crate::bitstream::BitWriter;
            let mut w = BitWriter::new(&mut buf);
            w.append_msb(0, 2); // 8-bit
            w.append_msb(63, 12); // width - 1
            w.append_msb(63, 12); // height - 1
            w.append_msb(32, 5); // n_segs - 1 = 32 -> n_segs = 33 (invalid)
            w.append_msb(0, 5); // seg_index
            w.flush();
        }
        let mut decoded = vec![0i16; 64 * 64];
        let mut image_out = ImageOut {
            width: 64,
            height: 64,
            space_width: 64,
            bit_depth: BitDepth::Eight,
            pixels: &mut decoded,
        };
        let (flags, results) = decompress(&[&buf], &mut image_out);
        assert_eq!(flags, DecoderStatus::NO_GOOD_SEGMENTS);
        assert_eq!(results[0].status, SegmentStatus::BAD_DATA);
    }

    #[test]
    fn short_segment_is_detected() {
        let buf = [0u8; 2]; // far too short to hold even the header
        let mut decoded = vec![0i16; 64 * 64];
        let mut image_out = ImageOut {
            width: 64,
            height: 64,
            space_width: 64,
            bit_depth: BitDepth::Eight,
            pixels: &mut decoded,
        };
        let (flags, results) = decompress(&[&buf], &mut image_out);
        assert_eq!(flags, DecoderStatus::NO_GOOD_SEGMENTS);
        assert_eq!(results[0].status, SegmentStatus::SHORT_DATA_SEG);
    }

    #[test]
    fn empty_blob_list_is_rejected_with_no_per_segment_processing() {
        let mut decoded = vec![0i16; 64 * 64];
        let mut image_out = ImageOut {
            width: 64,
            height: 64,
            space_width: 64,
            bit_depth: BitDepth::Eight,
            pixels: &mut decoded,
        };
        let (flags, results) = decompress(&[], &mut image_out);
        assert_eq!(flags, DecoderStatus::BAD_NUM_DATA_SEG);
        assert!(results.is_empty());
    }

    #[test]
    fn too_many_blobs_is_rejected() {
        let buf = [0u8; 8];
        let blobs: Vec<&[u8]> = (0..(crate::constants::MAX_SEGS + 1)).map(|_| &buf[..]).collect();
        let mut decoded = vec![0i16; 64 * 64];
        let mut image_out = ImageOut {
            width: 64,
            height: 64,
            space_width: 64,
            bit_depth: BitDepth::Eight,
            pixels: &mut decoded,
        };
        let (flags, results) = decompress(&blobs, &mut image_out);
        assert_eq!(flags, DecoderStatus::BAD_NUM_DATA_SEG);
        assert!(results.is_empty());
    }

    #[test]
    fn invalid_header_code_on_later_segment_is_inconsistent_not_bad_header() {
        let w = 32;
        let h = 32;
        let pixels = vec![7i16; (w * h) as usize];
        let image = Image { width: w, height: h, space_width: w, bit_depth: BitDepth::Eight, n_segs: 2, pixels: &pixels };
        let mut buf = vec![0u8; 4096];
        let (_flags, out) = compress(&image, &mut buf);

        let mut corrupted = buf.clone();
        // Flip the top bit of the second segment's header_code field so it
        // decodes to 0b10 (an invalid BitDepth value), simulating a bit-flip
        // landing on an already-established stream.
        let second_start = out.segments[1].start;
        corrupted[second_start] ^= 0b1000_0000;

        let byte_len0 = ((out.segments[0].bit_len + 7) / 8) as usize;
        let byte_len1 = ((out.segments[1].bit_len + 7) / 8) as usize;
        let blobs: Vec<&[u8]> = vec![
            &buf[out.segments[0].start..out.segments[0].start + byte_len0],
            &corrupted[second_start..second_start + byte_len1],
        ];

        let mut decoded = vec![0i16; (w * h) as usize];
        let mut image_out = ImageOut { width: w, height: h, space_width: w, bit_depth: BitDepth::Eight, pixels: &mut decoded };
        let (flags, results) = decompress(&blobs, &mut image_out);
        assert_eq!(flags, DecoderStatus::OK);
        assert_eq!(results[1].status, SegmentStatus::INCONSISTENT_DATA);
    }

    #[test]
    fn inconsistent_header_on_second_segment_is_detected() {
        let w = 32;
        let h = 32;
        let pixels = vec![7i16; (w * h) as usize];
        let image = Image { width: w, height: h, space_width: w, bit_depth: BitDepth::Eight, n_segs: 2, pixels: &pixels };
        let mut buf = vec![0u8; 4096];
        let (_flags, out) = compress(&image, &mut buf);

        let mut corrupted = buf.clone();
        // Flip the bit_depth field (bits 0-1 of the second segment's first byte).
        let second_start = out.segments[1].start;
        corrupted[second_start] ^= 0b0100_0000;

        let byte_len0 = ((out.segments[0].bit_len + 7) / 8) as usize;
        let byte_len1 = ((out.segments[1].bit_len + 7) / 8) as usize;
        let blobs: Vec<&[u8]> = vec![
            &buf[out.segments[0].start..out.segments[0].start + byte_len0],
            &corrupted[second_start..second_start + byte_len1],
        ];

        let mut decoded = vec![0i16; (w * h) as usize];
        let mut image_out = ImageOut { width: w, height: h, space_width: w, bit_depth: BitDepth::Eight, pixels: &mut decoded };
        let (flags, results) = decompress(&blobs, &mut image_out);
        assert_eq!(flags, DecoderStatus::OK);
        assert_eq!(results[1].status, SegmentStatus::INCONSISTENT_DATA);
    }
}
