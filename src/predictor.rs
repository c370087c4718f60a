//! MED (median edge detector) predictor, the same three-way branch the
//! teacher's JPEG-LS scan encoder uses for its causal prediction.

use crate::context::PixelSource;
use crate::image::Rectangle;

/// Predicts the value of pixel `(x, y)` from its causal neighbors, before
/// context-bias correction. `(x, y)` must not be one of the segment's two
/// raw-coded leading pixels.
pub fn predict_raw(src: &impl PixelSource, rect: &Rectangle, x: u32, y: u32) -> i32 {
    let g = |px: u32, py: u32| src.sample(px, py);

    if y == rect.ystart {
        // First row: only the causal left neighbor is available.
        return g(x - 1, y);
    }
    if x == rect.xstart {
        // First column: only the causal upper neighbor is available.
        return g(x, y - 1);
    }

    let a = g(x - 1, y);
    let b = g(x, y - 1);
    let c = g(x - 1, y - 1);

    if c >= a.max(b) {
        a.min(b)
    } else if c <= a.min(b) {
        a.max(b)
    } else {
        a + b - c
    }
}

/// Applies the context bias to a raw prediction and clips to `[0, pmax]`.
/// `flip` determines the sign of the bias correction.
pub fn apply_bias(est: i32, bias: i32, flip: bool, pmax: i32) -> i32 {
    let corrected = if flip { est - bias } else { est + bias };
    corrected.clamp(0, pmax)
}
