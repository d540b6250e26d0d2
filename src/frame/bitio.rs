// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Bit-level cursors over byte buffers.
//!
//! [`BitReader`] pulls bits out of the pending input buffer and [`BitWriter`]
//! packs decoded bits back into bytes. Both keep their position between
//! calls, so a payload does not need to line up with frame boundaries.
//!
//! Two bit orders exist: [`BitOrder::LsbFirst`] (native profile) starts at
//! bit 0 of each byte and walks up, [`BitOrder::MsbFirst`] (legacy profile)
//! starts at bit 7 and walks down.

/// Order in which the bits of a byte are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// Bit 0 (least significant) first.
    LsbFirst,
    /// Bit 7 (most significant) first.
    MsbFirst,
}

impl BitOrder {
    /// Shift amount of the `index`-th visited bit within a byte.
    #[inline]
    fn shift(self, index: u8) -> u8 {
        match self {
            Self::LsbFirst => index,
            Self::MsbFirst => 7 - index,
        }
    }
}

/// Sequential bit reader.
///
/// The reader does not own the buffer it walks; the codec hands it the
/// pending bytes on every call and tells it when consumed bytes were dropped
/// from the front via [`BitReader::rebase`].
#[derive(Debug, Clone)]
pub struct BitReader {
    order: BitOrder,
    byte: usize,
    bit: u8,
}

impl BitReader {
    pub fn new(order: BitOrder) -> Self {
        Self { order, byte: 0, bit: 0 }
    }

    /// Read one bit, or `None` once the buffer is exhausted.
    ///
    /// Running out of input is not an error: callers pad with zeros.
    pub fn read_bit(&mut self, buf: &[u8]) -> Option<u8> {
        let byte = *buf.get(self.byte)?;
        let value = (byte >> self.order.shift(self.bit)) & 1;
        self.bit += 1;
        if self.bit == 8 {
            self.bit = 0;
            self.byte += 1;
        }
        Some(value)
    }

    /// Read up to `width` bits as one symbol, first bit most significant.
    ///
    /// Returns the symbol and the number of bits actually read. A short read
    /// leaves the missing low-order bits zero.
    pub fn read_symbol(&mut self, buf: &[u8], width: u8) -> (u32, u8) {
        let mut symbol = 0u32;
        let mut got = 0u8;
        while got < width {
            match self.read_bit(buf) {
                Some(bit) => {
                    symbol = (symbol << 1) | bit as u32;
                    got += 1;
                }
                None => break,
            }
        }
        if got > 0 && got < width {
            symbol <<= width - got;
        }
        (symbol, got)
    }

    /// Index of the byte currently being read. Bytes before it are fully consumed.
    pub fn byte_index(&self) -> usize {
        self.byte
    }

    /// Bit position inside the current byte (0..8).
    pub fn bit_index(&self) -> u8 {
        self.bit
    }

    /// True when no bit is left in `buf`.
    pub fn is_exhausted(&self, buf: &[u8]) -> bool {
        self.byte >= buf.len()
    }

    /// Account for `consumed` bytes having been removed from the buffer front.
    pub fn rebase(&mut self, consumed: usize) {
        debug_assert!(consumed <= self.byte);
        self.byte -= consumed;
    }
}

/// Sequential bit writer that appends completed bytes to an output vector.
#[derive(Debug, Clone)]
pub struct BitWriter {
    order: BitOrder,
    acc: u8,
    bit: u8,
}

impl BitWriter {
    pub fn new(order: BitOrder) -> Self {
        Self { order, acc: 0, bit: 0 }
    }

    /// Write one bit. Completing a byte pushes it to `out` and resets the accumulator.
    pub fn write_bit(&mut self, value: u8, out: &mut Vec<u8>) {
        self.acc |= (value & 1) << self.order.shift(self.bit);
        self.bit += 1;
        if self.bit == 8 {
            out.push(self.acc);
            self.acc = 0;
            self.bit = 0;
        }
    }

    /// Write the low `width` bits of `symbol`, most significant first.
    pub fn write_symbol(&mut self, symbol: u32, width: u8, out: &mut Vec<u8>) {
        for i in (0..width).rev() {
            self.write_bit(((symbol >> i) & 1) as u8, out);
        }
    }

    /// Number of bits held in the unfinished byte.
    pub fn pending_bits(&self) -> u8 {
        self.bit
    }
}
