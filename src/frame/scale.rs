// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Cell ↔ block scaling between the logical and physical images.
//!
//! Both images are packed RGB24, row-major. The physical image is `width * scale`
//! pixels wide; rows past `height * scale` are never touched, which leaves the
//! black margin below the data region intact.

/// Nearest-neighbour upscale: every logical pixel becomes a `scale × scale` block.
///
/// `logical` must hold `width * height * 3` bytes and `physical` at least
/// `width * height * scale² * 3` bytes.
pub fn scale_up(logical: &[u8], physical: &mut [u8], width: usize, height: usize, scale: usize) {
    let row_len = width * scale * 3;
    debug_assert!(logical.len() >= width * height * 3);
    debug_assert!(physical.len() >= row_len * height * scale);

    for y in 0..height {
        let band = &mut physical[row_len * scale * y..row_len * scale * (y + 1)];
        let (first, rest) = band.split_at_mut(row_len);

        let src_row = &logical[width * 3 * y..width * 3 * (y + 1)];
        for (dst, px) in first.chunks_exact_mut(scale * 3).zip(src_row.chunks_exact(3)) {
            for out in dst.chunks_exact_mut(3) {
                out.copy_from_slice(px);
            }
        }
        for row in rest.chunks_exact_mut(row_len) {
            row.copy_from_slice(first);
        }
    }
}

/// Box-filter downscale: every `scale × scale` block collapses to the
/// truncated per-component mean of its pixels.
///
/// `logical` must hold `width * height * 3` bytes.
pub fn scale_down(physical: &[u8], logical: &mut [u8], width: usize, height: usize, scale: usize) {
    let row_len = width * scale * 3;
    let area = (scale * scale) as u32;
    debug_assert!(physical.len() >= row_len * height * scale);
    debug_assert!(logical.len() >= width * height * 3);

    for y in 0..height {
        for x in 0..width {
            let mut sum = [0u32; 3];
            for sy in y * scale..(y + 1) * scale {
                let start = sy * row_len + x * scale * 3;
                for px in physical[start..start + scale * 3].chunks_exact(3) {
                    sum[0] += px[0] as u32;
                    sum[1] += px[1] as u32;
                    sum[2] += px[2] as u32;
                }
            }
            let out = &mut logical[(y * width + x) * 3..(y * width + x) * 3 + 3];
            for c in 0..3 {
                out[c] = (sum[c] / area) as u8;
            }
        }
    }
}
