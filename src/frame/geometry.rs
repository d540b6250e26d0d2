// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Frame geometry: how a physical video frame is carved into data cells.

use super::error::{FrameError, Result};
use super::pixels::PixelFormat;

/// Immutable description of one frame layout.
///
/// The physical frame is `width × height` RGB24 pixels. Only the top
/// `data_height` rows carry cells; each cell is a `block_size` square that
/// encodes one `bits_per_pixel`-bit symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    width: u32,
    height: u32,
    data_height: u32,
    block_size: u32,
    format: PixelFormat,
}

impl FrameGeometry {
    pub fn new(
        width: u32,
        height: u32,
        data_height: u32,
        block_size: u32,
        bits_per_pixel: u32,
    ) -> Result<Self> {
        if block_size == 0
            || width % block_size != 0
            || height % block_size != 0
            || data_height % block_size != 0
        {
            return Err(FrameError::InvalidBlockSize { block_size, width, height });
        }
        if data_height > height {
            return Err(FrameError::InvalidDataHeight { data_height, height });
        }
        let format = PixelFormat::new(bits_per_pixel)?;
        let geometry = Self { width, height, data_height, block_size, format };
        if geometry.cells_per_frame() == 0 {
            return Err(FrameError::TooFewCells { cells: 0, reserved: 0 });
        }
        Ok(geometry)
    }

    /// Same frame, different cell layout.
    pub fn with_cells(&self, block_size: u32, bits_per_pixel: u32) -> Result<Self> {
        Self::new(self.width, self.height, self.data_height, block_size, bits_per_pixel)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data_height(&self) -> u32 {
        self.data_height
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.format.bits_per_pixel() as u32
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Cells per row.
    pub fn cells_wide(&self) -> usize {
        (self.width / self.block_size) as usize
    }

    /// Cell rows in the data region.
    pub fn cells_high(&self) -> usize {
        (self.data_height / self.block_size) as usize
    }

    pub fn cells_per_frame(&self) -> usize {
        self.cells_wide() * self.cells_high()
    }

    /// Bytes in the logical (one pixel per cell) image.
    pub fn logical_len(&self) -> usize {
        self.cells_per_frame() * 3
    }

    /// Bytes in one physical RGB24 frame, margin included.
    pub fn physical_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Payload bits one frame can carry when `reserved` cells are set aside.
    pub fn payload_bits(&self, reserved: usize) -> u64 {
        self.cells_per_frame().saturating_sub(reserved) as u64 * self.bits_per_pixel() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hd_layout() {
        let g = FrameGeometry::new(1280, 720, 720, 4, 1).unwrap();
        assert_eq!(g.cells_wide(), 320);
        assert_eq!(g.cells_high(), 180);
        assert_eq!(g.cells_per_frame(), 57_600);
        assert_eq!(g.physical_len(), 1280 * 720 * 3);
        assert_eq!(g.payload_bits(32), 57_568);
    }

    #[test]
    fn data_height_shrinks_cells_not_frame() {
        let g = FrameGeometry::new(1280, 720, 360, 4, 3).unwrap();
        assert_eq!(g.cells_high(), 90);
        assert_eq!(g.physical_len(), 1280 * 720 * 3);
        assert_eq!(g.payload_bits(0), 320 * 90 * 3);
    }

    #[test]
    fn block_must_divide_frame() {
        assert!(matches!(
            FrameGeometry::new(1280, 720, 720, 7, 1),
            Err(FrameError::InvalidBlockSize { block_size: 7, .. })
        ));
        assert!(matches!(
            FrameGeometry::new(1280, 720, 720, 0, 1),
            Err(FrameError::InvalidBlockSize { .. })
        ));
        assert!(matches!(
            FrameGeometry::new(1280, 720, 718, 4, 1),
            Err(FrameError::InvalidBlockSize { .. })
        ));
    }

    #[test]
    fn rejects_tall_data_region_and_bad_depth() {
        assert!(matches!(
            FrameGeometry::new(64, 64, 128, 4, 1),
            Err(FrameError::InvalidDataHeight { .. })
        ));
        assert_eq!(
            FrameGeometry::new(64, 64, 64, 4, 25),
            Err(FrameError::InvalidBitsPerPixel(25))
        );
    }

    #[test]
    fn with_cells_keeps_frame() {
        let g = FrameGeometry::new(1280, 720, 720, 8, 1).unwrap();
        let data = g.with_cells(2, 24).unwrap();
        assert_eq!(data.physical_len(), g.physical_len());
        assert_eq!(data.cells_per_frame(), 640 * 360);
    }
}
