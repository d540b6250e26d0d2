// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Symbol ↔ RGB pixel quantization.
//!
//! An N-bit symbol is split across the three colour components: each gets
//! `N / 3` bits and the first `N % 3` components get one more. Component 0
//! holds the most significant bits. A `b`-bit component value `s` is written
//! as `round(s * 255 / (2^b - 1))` and read back as `round(v * (2^b - 1) / 255)`,
//! spreading the levels evenly over 0..=255.
//!
//! One bit per pixel is special: the symbol is written as pure black or white
//! and read back by thresholding the mean of all three components at 127.

use super::error::{FrameError, Result};

/// Maximum supported symbol width.
pub const MAX_BITS_PER_PIXEL: u8 = 24;

/// Per-depth quantization parameters, computed once per stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    bits_per_pixel: u8,
    widths: [u8; 3],
    /// `2^width - 1` for each component (0 for unused components).
    levels: [u32; 3],
}

impl PixelFormat {
    pub fn new(bits_per_pixel: u32) -> Result<Self> {
        if bits_per_pixel == 0 || bits_per_pixel > MAX_BITS_PER_PIXEL as u32 {
            return Err(FrameError::InvalidBitsPerPixel(bits_per_pixel));
        }
        let n = bits_per_pixel as u8;
        let mut widths = [n / 3; 3];
        for w in widths.iter_mut().take((n % 3) as usize) {
            *w += 1;
        }
        let levels = widths.map(|w| (1u32 << w) - 1);
        Ok(Self { bits_per_pixel: n, widths, levels })
    }

    pub fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }

    /// Bit width of each component, most significant first.
    pub fn component_widths(&self) -> [u8; 3] {
        self.widths
    }

    /// Write `symbol` into one RGB pixel.
    pub fn encode(&self, symbol: u32, pixel: &mut [u8]) {
        if self.bits_per_pixel == 1 {
            let v = if symbol & 1 == 1 { 0xFF } else { 0x00 };
            pixel[..3].fill(v);
            return;
        }
        let mut shift = self.bits_per_pixel;
        for c in 0..3 {
            let width = self.widths[c];
            let levels = self.levels[c];
            if width == 0 {
                pixel[c] = 0;
                continue;
            }
            shift -= width;
            let s = (symbol >> shift) & levels;
            // round(s * 255 / levels)
            pixel[c] = ((s * 255 * 2 + levels) / (levels * 2)) as u8;
        }
    }

    /// Recover the symbol carried by one RGB pixel.
    pub fn decode(&self, pixel: &[u8]) -> u32 {
        if self.bits_per_pixel == 1 {
            let mean = (pixel[0] as u32 + pixel[1] as u32 + pixel[2] as u32) / 3;
            return (mean > 127) as u32;
        }
        let mut symbol = 0u32;
        for c in 0..3 {
            let width = self.widths[c];
            if width == 0 {
                continue;
            }
            let levels = self.levels[c];
            // round(v * levels / 255)
            let s = (pixel[c] as u32 * levels * 2 + 255) / 510;
            symbol = (symbol << width) | s;
        }
        symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_split_unevenly() {
        assert_eq!(PixelFormat::new(1).unwrap().component_widths(), [1, 0, 0]);
        assert_eq!(PixelFormat::new(2).unwrap().component_widths(), [1, 1, 0]);
        assert_eq!(PixelFormat::new(3).unwrap().component_widths(), [1, 1, 1]);
        assert_eq!(PixelFormat::new(8).unwrap().component_widths(), [3, 3, 2]);
        assert_eq!(PixelFormat::new(24).unwrap().component_widths(), [8, 8, 8]);
    }

    #[test]
    fn rejects_out_of_range_depth() {
        assert_eq!(PixelFormat::new(0), Err(FrameError::InvalidBitsPerPixel(0)));
        assert_eq!(PixelFormat::new(25), Err(FrameError::InvalidBitsPerPixel(25)));
    }

    #[test]
    fn every_symbol_survives_unperturbed() {
        for bpp in 1..=16u32 {
            let fmt = PixelFormat::new(bpp).unwrap();
            let mut px = [0u8; 3];
            for s in 0..(1u32 << bpp) {
                fmt.encode(s, &mut px);
                assert_eq!(fmt.decode(&px), s, "bpp={bpp} symbol={s}");
            }
        }
    }

    #[test]
    fn wide_depths_survive_sampled_symbols() {
        for bpp in 17..=24u32 {
            let fmt = PixelFormat::new(bpp).unwrap();
            let mut px = [0u8; 3];
            let max = (1u32 << bpp) - 1;
            for s in (0..=max).step_by(4099).chain([max]) {
                fmt.encode(s, &mut px);
                assert_eq!(fmt.decode(&px), s, "bpp={bpp} symbol={s}");
            }
        }
    }

    #[test]
    fn quantization_is_monotonic_per_component() {
        for bpp in 2..=24u32 {
            let fmt = PixelFormat::new(bpp).unwrap();
            let width = fmt.component_widths()[0] as u32;
            let shift = bpp - width;
            let mut prev = None;
            for s in 0..(1u32 << width) {
                let mut px = [0u8; 3];
                fmt.encode(s << shift, &mut px);
                if let Some(p) = prev {
                    assert!(px[0] > p, "bpp={bpp} not increasing at {s}");
                }
                prev = Some(px[0]);
            }
        }
    }

    #[test]
    fn one_bit_is_black_or_white() {
        let fmt = PixelFormat::new(1).unwrap();
        let mut px = [7u8; 3];
        fmt.encode(1, &mut px);
        assert_eq!(px, [0xFF; 3]);
        fmt.encode(0, &mut px);
        assert_eq!(px, [0x00; 3]);
    }

    #[test]
    fn one_bit_thresholds_the_mean() {
        let fmt = PixelFormat::new(1).unwrap();
        // A single bright component is not enough.
        assert_eq!(fmt.decode(&[255, 60, 60]), 0);
        assert_eq!(fmt.decode(&[200, 100, 90]), 1);
        assert_eq!(fmt.decode(&[127, 127, 127]), 0);
        assert_eq!(fmt.decode(&[128, 128, 128]), 1);
    }

    #[test]
    fn full_depth_is_identity() {
        let fmt = PixelFormat::new(24).unwrap();
        let mut px = [0u8; 3];
        fmt.encode(0x12_34_56, &mut px);
        assert_eq!(px, [0x12, 0x34, 0x56]);
    }

    #[test]
    fn tolerates_small_noise() {
        let fmt = PixelFormat::new(6).unwrap();
        let mut px = [0u8; 3];
        fmt.encode(0b10_01_11, &mut px);
        let noisy = [px[0].saturating_add(9), px[1].saturating_sub(9), px[2].saturating_sub(9)];
        assert_eq!(fmt.decode(&noisy), 0b10_01_11);
    }
}
