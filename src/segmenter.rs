//! Deterministic tiling of an image into `n_segs` near-equal rectangles.
//!
//! Both the encoder and the decoder run this same algorithm (the encoder to
//! know where each segment's pixels live, the decoder to know where to
//! place them), so every step here uses exact integer arithmetic — never
//! floating point — to guarantee bit-for-bit agreement regardless of host.

use crate::image::Rectangle;

/// Splits `total` into `count` non-negative integer cell sizes summing to
/// `total`, smaller cells first. `count` must be nonzero when `total > 0`.
fn partition_sizes(total: u32, count: u32) -> Vec<u32> {
    if count == 0 {
        return Vec::new();
    }
    let w = total / count;
    let extra = total - w * count; // number of cells sized w+1
    let small_count = count - extra;
    let mut sizes = Vec::with_capacity(count as usize);
    sizes.extend(std::iter::repeat(w).take(small_count as usize));
    sizes.extend(std::iter::repeat(w + 1).take(extra as usize));
    sizes
}

/// Integer round-half-up of `a / b` for nonnegative `a`, positive `b`.
fn round_div(a: u64, b: u64) -> u64 {
    (2 * a + b) / (2 * b)
}

/// Computes the `N`-rectangle tiling of a `width x height` image.
///
/// Returns rectangles in row-major order. Callers are expected to have
/// already validated `width`, `height` and `n_segs` via
/// [`crate::image::check_image`].
pub fn segment(width: u32, height: u32, n_segs: u32) -> Vec<Rectangle> {
    let n = n_segs as u64;

    // Step 1: smallest R in [1, n_segs] with (R+1)*R*W >= H*N, else N.
    let mut rows = n_segs;
    for r in 1..=n_segs {
        let r64 = r as u64;
        if (r64 + 1) * r64 * width as u64 >= height as u64 * n {
            rows = r;
            break;
        }
    }

    let c_top = n_segs / rows;
    let r_top = (c_top + 1) * rows - n_segs;

    let h_top = if r_top == 0 {
        0
    } else {
        let raw = round_div(
            height as u64 * c_top as u64 * r_top as u64,
            n_segs as u64,
        ) as u32;
        raw.max(r_top)
    };

    let mut rects = Vec::with_capacity(n_segs as usize);

    // Top region: r_top rows, c_top columns each.
    if r_top > 0 {
        let row_heights = partition_sizes(h_top, r_top);
        let col_widths = partition_sizes(width, c_top);
        let mut y = 0u32;
        for h in row_heights {
            let mut x = 0u32;
            for &w in &col_widths {
                rects.push(Rectangle {
                    xstart: x,
                    xend: x + w,
                    ystart: y,
                    yend: y + h,
                });
                x += w;
            }
            y += h;
        }
    }

    // Bottom region: (rows - r_top) rows, (c_top + 1) columns each.
    let bottom_rows = rows - r_top;
    if bottom_rows > 0 {
        let bottom_height = height - h_top;
        let row_heights = partition_sizes(bottom_height, bottom_rows);
        let col_widths = partition_sizes(width, c_top + 1);
        let mut y = h_top;
        for h in row_heights {
            let mut x = 0u32;
            for &w in &col_widths {
                rects.push(Rectangle {
                    xstart: x,
                    xend: x + w,
                    ystart: y,
                    yend: y + h,
                });
                x += w;
            }
            y += h;
        }
    }

    rects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tiles_exactly(rects: &[Rectangle], width: u32, height: u32) {
        let total_area: u64 = rects.iter().map(|r| r.area()).sum();
        assert_eq!(total_area, width as u64 * height as u64);

        // Every cell has positive area.
        for r in rects {
            assert!(r.width() > 0 && r.height() > 0);
            assert!(r.xend <= width && r.yend <= height);
        }

        // Pairwise disjoint interiors: brute-force pixel coverage check.
        let mut covered = vec![false; (width as usize) * (height as usize)];
        for r in rects {
            for y in r.ystart..r.yend {
                for x in r.xstart..r.xend {
                    let idx = (y as usize) * (width as usize) + x as usize;
                    assert!(!covered[idx], "pixel ({x},{y}) covered twice");
                    covered[idx] = true;
                }
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn single_segment_is_whole_image() {
        let rects = segment(64, 48, 1);
        assert_eq!(rects.len(), 1);
        assert_tiles_exactly(&rects, 64, 48);
    }

    #[test]
    fn many_segment_counts_tile_exactly() {
        for n in [1u32, 2, 3, 4, 5, 7, 10, 16, 31, 32] {
            let rects = segment(480, 480, n);
            assert_eq!(rects.len(), n as usize);
            assert_tiles_exactly(&rects, 480, 480);
        }
    }

    #[test]
    fn non_square_images_tile_exactly() {
        for (w, h) in [(640u32, 100u32), (100, 640), (4096, 4), (4, 4096)] {
            for n in [1u32, 4, 9, 17] {
                if (w as u64) * (h as u64) < (n as u64) * 200 {
                    continue;
                }
                let rects = segment(w, h, n);
                assert_eq!(rects.len(), n as usize);
                assert_tiles_exactly(&rects, w, h);
            }
        }
    }
}
