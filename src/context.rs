//! Context derivation: four causal-neighbor gradients quantized through
//! fixed lookup tables into a 10-bit context index, plus the orientation
//! flip that folds sign-symmetric contexts together so they share one set
//! of statistics.

use crate::bit_depth::BitDepth;
use crate::image::Rectangle;

/// sign bit position within a `G`-table bucket (3-bit: bits 0-1 magnitude,
/// bit 2 sign).
const G_SIGN_BIT: u8 = 0b100;
/// sign bit position within a `GFOUR`-table bucket (2-bit: bit 0 magnitude,
/// bit 1 sign).
const GFOUR_SIGN_BIT: u8 = 0b10;

pub struct ContextResult {
    pub index: usize,
    pub flip: bool,
}

/// A causal pixel accessor: `(x, y) -> sample value`. Shared by the encoder
/// (reading the source image) and the decoder (reading pixels already
/// reconstructed into the output buffer, possibly from a different,
/// earlier-decoded segment).
pub trait PixelSource {
    fn sample(&self, x: u32, y: u32) -> i32;
}

impl<F: Fn(u32, u32) -> i32> PixelSource for F {
    fn sample(&self, x: u32, y: u32) -> i32 {
        self(x, y)
    }
}

fn raw_gradients(
    src: &impl PixelSource,
    rect: &Rectangle,
    x: u32,
    y: u32,
) -> (i32, i32, i32, i32, bool, bool, bool) {
    let g = |px: u32, py: u32| src.sample(px, py);

    if y == rect.ystart {
        let d4 = if x >= rect.xstart + 2 { g(x - 1, y) - g(x - 2, y) } else { 0 };
        (0, 0, 0, d4, true, true, false)
    } else if x == rect.xend - 1 {
        let d2 = g(x, y - 1) - g(x - 1, y - 1);
        let d3 = g(x - 1, y - 1) - g(x - 1, y);
        let d4 = g(x - 1, y) - g(x - 2, y);
        (0, d2, d3, d4, true, false, false)
    } else if x == rect.xstart {
        let d1 = g(x + 1, y - 1) - g(x, y - 1);
        (d1, 0, 0, 0, false, true, true)
    } else if x == rect.xstart + 1 {
        let d1 = g(x + 1, y - 1) - g(x, y - 1);
        let d2 = g(x, y - 1) - g(x - 1, y - 1);
        let d3 = g(x - 1, y - 1) - g(x - 1, y);
        (d1, d2, d3, 0, false, false, true)
    } else {
        let d1 = g(x + 1, y - 1) - g(x, y - 1);
        let d2 = g(x, y - 1) - g(x - 1, y - 1);
        let d3 = g(x - 1, y - 1) - g(x - 1, y);
        let d4 = g(x - 1, y) - g(x - 2, y);
        (d1, d2, d3, d4, false, false, false)
    }
}

/// Computes the context index and orientation flip for pixel `(x, y)`
/// within `rect`. `(x, y)` must not be one of the segment's two raw-coded
/// leading pixels.
pub fn compute_context(
    bit_depth: BitDepth,
    src: &impl PixelSource,
    rect: &Rectangle,
    x: u32,
    y: u32,
) -> ContextResult {
    let (d1, d2, d3, d4, f1, f3, f4) = raw_gradients(src, rect, x, y);

    let g = bit_depth.g_table();
    let gfour = bit_depth.gfour_table();

    let b1 = g[bit_depth.g_index(d1)];
    let b2 = g[bit_depth.g_index(d2)];
    let b3 = g[bit_depth.g_index(d3)];
    let b4 = gfour[bit_depth.g_index(d4)];

    let flip = (b2 & G_SIGN_BIT) != 0
        || (b2 == 0
            && ((b1 & G_SIGN_BIT) != 0
                || (b1 == 0
                    && ((b3 & G_SIGN_BIT) != 0 || (b3 == 0 && (b4 & GFOUR_SIGN_BIT) != 0)))));

    let adjust_g = |b: u8| -> u32 {
        if flip && b != 0 {
            (b ^ G_SIGN_BIT) as u32
        } else {
            b as u32
        }
    };
    let adjust_gfour = |b: u8| -> u32 {
        if flip && b != 0 {
            (b ^ GFOUR_SIGN_BIT) as u32
        } else {
            b as u32
        }
    };

    let a1 = adjust_g(b1);
    let a2 = adjust_g(b2);
    let a3 = adjust_g(b3);
    let a4 = adjust_gfour(b4);

    let index = (a4
        | (a3 << 2)
        | (a1 << 5)
        | (a2 << 8)
        | ((f4 as u32) << 1)
        | ((f3 as u32) << 4)
        | ((f1 as u32) << 7)) as usize;

    debug_assert!(index < crate::constants::NCONTEXTS);

    ContextResult { index, flip }
}
