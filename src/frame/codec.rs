// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Frame codec context.
//!
//! [`FrameCodec`] owns the working buffers of one encode or decode run:
//!
//! ```text
//! pending   raw input bytes not yet placed into a frame
//! logical   one RGB pixel per cell
//! physical  the upscaled RGB24 video frame (black margin included)
//! output    decoded bytes not yet flushed by the caller
//! ```
//!
//! The bit cursors live here too and persist across frames: a byte may start
//! in one frame and finish in the next.
//!
//! When a length prefix is reserved, cells `0..32` hold a 32-bit big-endian
//! count of the payload bits carried by the frame, one bit per cell in black
//! and white regardless of the data depth.

use super::bitio::{BitOrder, BitReader, BitWriter};
use super::error::{FrameError, Result};
use super::geometry::FrameGeometry;
use super::pixels::PixelFormat;
use super::scale::{scale_down, scale_up};

/// Cells taken by the length prefix when one is reserved.
pub const LENGTH_PREFIX_CELLS: usize = 32;

/// Working state for turning bytes into frames and back.
pub struct FrameCodec {
    geometry: FrameGeometry,
    format: PixelFormat,
    prefix_format: PixelFormat,
    reserved: usize,
    pending: Vec<u8>,
    reader: BitReader,
    writer: BitWriter,
    output: Vec<u8>,
    logical: Vec<u8>,
    physical: Vec<u8>,
}

impl FrameCodec {
    /// Allocate a codec for `geometry`.
    ///
    /// `reserved` is the number of leading cells set aside for the length
    /// prefix: either 0 or [`LENGTH_PREFIX_CELLS`].
    pub fn new(geometry: FrameGeometry, order: BitOrder, reserved: usize) -> Result<Self> {
        debug_assert!(reserved == 0 || reserved == LENGTH_PREFIX_CELLS);
        let cells = geometry.cells_per_frame();
        if cells <= reserved {
            return Err(FrameError::TooFewCells { cells, reserved });
        }
        let mut codec = Self {
            geometry,
            format: geometry.pixel_format(),
            prefix_format: PixelFormat::new(1)?,
            reserved,
            pending: Vec::new(),
            reader: BitReader::new(order),
            writer: BitWriter::new(order),
            output: Vec::new(),
            logical: Vec::new(),
            physical: Vec::new(),
        };
        codec.ensure_capacity();
        Ok(codec)
    }

    fn ensure_capacity(&mut self) {
        let pending = self.pending_capacity();
        if self.pending.capacity() < pending {
            self.pending.reserve(pending - self.pending.len());
        }
        self.logical.resize(self.geometry.logical_len(), 0);
        self.physical.resize(self.geometry.physical_len(), 0);
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn reserved_cells(&self) -> usize {
        self.reserved
    }

    /// Payload bits one frame carries.
    pub fn frame_bits(&self) -> u64 {
        self.geometry.payload_bits(self.reserved)
    }

    /// Pending bytes needed to be sure a frame can be filled completely,
    /// counting the byte that may be partially consumed already.
    ///
    /// The cursor can sit up to 7 bits into the first pending byte, so a
    /// frame whose capacity is not a whole number of bytes needs the rounded
    /// up byte count plus one.
    pub fn pending_capacity(&self) -> usize {
        self.frame_bits().div_ceil(8) as usize + 1
    }

    /// How many more bytes [`FrameCodec::extend_pending`] should receive
    /// before the next [`FrameCodec::fill_frame`].
    pub fn pending_room(&self) -> usize {
        self.pending_capacity().saturating_sub(self.pending.len())
    }

    pub fn extend_pending(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// True while some pending bit has not been placed into a frame.
    pub fn has_pending(&self) -> bool {
        !self.reader.is_exhausted(&self.pending)
    }

    /// Fill the physical frame from pending bytes.
    ///
    /// Cells past the end of the input are zero. Returns the number of
    /// pending bytes fully consumed; hand it to [`FrameCodec::slide`] before
    /// topping the buffer up again.
    pub fn fill_frame(&mut self) -> usize {
        let cells = self.geometry.cells_per_frame();
        let width = self.format.bits_per_pixel();
        let mut idx = self.reserved;
        let mut bits = 0u64;

        while idx < cells {
            let (symbol, got) = self.reader.read_symbol(&self.pending, width);
            if got == 0 {
                break;
            }
            self.format.encode(symbol, &mut self.logical[idx * 3..idx * 3 + 3]);
            bits += got as u64;
            idx += 1;
            if got < width {
                break;
            }
        }
        self.logical[idx * 3..].fill(0);

        // The prefix holds payload bits, not cells: above 8 bits per pixel a
        // cell count cannot tell where the payload ends inside a padded cell.
        if self.reserved > 0 {
            debug_assert!(bits <= u32::MAX as u64);
            self.write_prefix(bits as u32);
        }

        let g = &self.geometry;
        scale_up(
            &self.logical,
            &mut self.physical,
            g.cells_wide(),
            g.cells_high(),
            g.block_size() as usize,
        );
        self.reader.byte_index()
    }

    /// Drop `consumed` bytes from the front of the pending buffer.
    pub fn slide(&mut self, consumed: usize) {
        self.pending.drain(..consumed);
        self.reader.rebase(consumed);
    }

    fn write_prefix(&mut self, value: u32) {
        for i in 0..LENGTH_PREFIX_CELLS {
            let bit = (value >> (31 - i)) & 1;
            self.prefix_format.encode(bit, &mut self.logical[i * 3..i * 3 + 3]);
        }
    }

    fn read_prefix(&self) -> u32 {
        (0..LENGTH_PREFIX_CELLS).fold(0u32, |acc, i| {
            (acc << 1) | self.prefix_format.decode(&self.logical[i * 3..i * 3 + 3])
        })
    }

    /// The frame produced by the last [`FrameCodec::fill_frame`].
    pub fn physical(&self) -> &[u8] {
        &self.physical
    }

    /// Copy a received frame into the physical buffer.
    pub fn load_physical(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() != self.physical.len() {
            return Err(FrameError::FrameSizeMismatch {
                expected: self.physical.len(),
                actual: frame.len(),
            });
        }
        self.physical.copy_from_slice(frame);
        Ok(())
    }

    /// Decode the physical buffer into the output buffer.
    ///
    /// `bit_limit` caps the payload bits taken from this frame on top of the
    /// length prefix. Returns the number of bytes appended to the output.
    pub fn decode_frame(&mut self, bit_limit: Option<u64>) -> usize {
        let g = &self.geometry;
        scale_down(
            &self.physical,
            &mut self.logical,
            g.cells_wide(),
            g.cells_high(),
            g.block_size() as usize,
        );

        let mut bits = self.frame_bits();
        if self.reserved > 0 {
            bits = bits.min(self.read_prefix() as u64);
        }
        if let Some(limit) = bit_limit {
            bits = bits.min(limit);
        }

        let before = self.output.len();
        let width = self.format.bits_per_pixel() as u64;
        let mut idx = self.reserved;
        while bits > 0 {
            let symbol = self.format.decode(&self.logical[idx * 3..idx * 3 + 3]);
            let take = bits.min(width);
            self.writer
                .write_symbol(symbol >> (width - take), take as u8, &mut self.output);
            bits -= take;
            idx += 1;
        }
        self.output.len() - before
    }

    /// Decoded bytes not yet flushed.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }
}
