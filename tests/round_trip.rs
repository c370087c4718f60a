//! Property-based round-trip and tiling tests, generating images and
//! segment counts rather than relying on fixture files.

use locoflight::decoder::decompress;
use locoflight::encoder::compress;
use locoflight::status::{DecoderStatus, EncoderStatus, SegmentStatus};
use locoflight::{BitDepth, Image, ImageOut};
use proptest::prelude::*;

fn do_round_trip(width: u32, height: u32, bit_depth: BitDepth, n_segs: u32, pixels: Vec<i16>) {
    let image = Image { width, height, space_width: width, bit_depth, n_segs, pixels: &pixels };
    let mut buf = vec![0u8; (width as usize) * (height as usize) * 4 + 4096];
    let (enc_flags, compressed) = compress(&image, &mut buf);
    prop_assert_flags_ok(enc_flags);

    let blobs: Vec<&[u8]> = compressed
        .segments
        .iter()
        .map(|s| {
            let byte_len = ((s.bit_len + 7) / 8) as usize;
            &buf[s.start..s.start + byte_len]
        })
        .collect();

    let mut decoded = vec![0i16; (width as usize) * (height as usize)];
    let mut image_out = ImageOut { width, height, space_width: width, bit_depth, pixels: &mut decoded };
    let (dec_flags, results) = decompress(&blobs, &mut image_out);

    assert_eq!(dec_flags, DecoderStatus::OK);
    for r in &results {
        assert_eq!(r.status, SegmentStatus::OK, "segment status {:?}", r.status);
        assert_eq!(r.n_missing_pixels, 0);
    }
    assert_eq!(decoded, pixels, "{width}x{height} n_segs={n_segs} round-trip mismatch");
}

fn prop_assert_flags_ok(flags: EncoderStatus) {
    assert_eq!(flags, EncoderStatus::OK, "unexpected encoder flags {flags:?}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn round_trips_8_bit(
        w in 8u32..96,
        h in 8u32..96,
        n_segs in 1u32..9,
        seed in any::<u32>(),
    ) {
        prop_assume!((w as u64) * (h as u64) >= (n_segs as u64) * 200);
        let mut s = seed.max(1);
        let pixels: Vec<i16> = (0..(w * h))
            .map(|_| {
                s = s.wrapping_mul(1103515245).wrapping_add(12345);
                ((s >> 16) & 0xFF) as i16
            })
            .collect();
        do_round_trip(w, h, BitDepth::Eight, n_segs, pixels);
    }

    #[test]
    fn round_trips_12_bit(
        w in 8u32..96,
        h in 8u32..96,
        n_segs in 1u32..9,
        seed in any::<u32>(),
    ) {
        prop_assume!((w as u64) * (h as u64) >= (n_segs as u64) * 200);
        let mut s = seed.max(1);
        let pixels: Vec<i16> = (0..(w * h))
            .map(|_| {
                s = s.wrapping_mul(1103515245).wrapping_add(12345);
                ((s >> 16) & 0xFFF) as i16
            })
            .collect();
        do_round_trip(w, h, BitDepth::Twelve, n_segs, pixels);
    }

    #[test]
    fn segmenter_tiles_exactly(
        w in 16u32..512,
        h in 16u32..512,
        n_segs in 1u32..33,
    ) {
        prop_assume!((w as u64) * (h as u64) >= (n_segs as u64) * 200);
        let rects = locoflight::segmenter::segment(w, h, n_segs);
        prop_assert_eq!(rects.len(), n_segs as usize);
        let total_area: u64 = rects.iter().map(|r| r.area()).sum();
        prop_assert_eq!(total_area, w as u64 * h as u64);
        for r in &rects {
            prop_assert!(r.width() > 0 && r.height() > 0);
        }
    }
}

#[test]
fn constant_image_scenario() {
    let w = 480;
    let h = 480;
    let pixels = vec![0i16; (w * h) as usize];
    let image = Image { width: w, height: h, space_width: w, bit_depth: BitDepth::Eight, n_segs: 31, pixels: &pixels };
    let mut buf = vec![0u8; (w as usize) * (h as usize) * 4];
    let (flags, compressed) = compress(&image, &mut buf);
    assert_eq!(flags, EncoderStatus::OK);
    assert!(compressed.compressed_size_bytes < 1024, "got {} bytes", compressed.compressed_size_bytes);
}

#[test]
fn constant_max_value_image_scenario() {
    let w = 480;
    let h = 480;
    let pixels = vec![4095i16; (w * h) as usize];
    do_round_trip(w, h, BitDepth::Twelve, 31, pixels);
}

#[test]
fn pseudo_random_uniform_image_scenario() {
    let w = 480;
    let h = 480;
    let mut s = 0xC0FFEEu32;
    let pixels: Vec<i16> = (0..(w * h))
        .map(|_| {
            s = s.wrapping_mul(1103515245).wrapping_add(12345);
            ((s >> 16) & 0xFFF) as i16
        })
        .collect();
    do_round_trip(w, h, BitDepth::Twelve, 10, pixels);
}
