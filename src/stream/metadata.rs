// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Metadata records carried by the first frame of every video.
//!
//! Native layout (bytes, one bit per cell after the length prefix):
//! ```text
//! [0] format version
//! [1] block size
//! [2] bits per pixel
//! [3] checksum = (version + block size + bits per pixel) mod 256
//! [4] frame repeat (version >= 2 only)
//! ```
//!
//! Legacy layout (big-endian u32 words, no prefix, no checksum):
//! ```text
//! [0] colour mode: 0 = one bit per pixel, 0xFFFFFFFF = 24 bits per pixel
//! [1] final frame (the metadata frame is frame 0)
//! [2] final byte: payload bytes emitted while decoding the final frame
//! [3] block size
//! [4] 0xFFFFFFFF sentinel
//! ```

use super::error::{Result, StreamError};

/// Native metadata version written by this crate.
pub const FORMAT_VERSION: u8 = 2;

/// Legacy colour mode for black and white cells.
pub const LEGACY_COLOR_BINARY: u32 = 0;

/// Legacy colour mode for full 24-bit cells.
pub const LEGACY_COLOR_FULL: u32 = 0xFFFF_FFFF;

/// Closing word of a legacy metadata record.
pub const LEGACY_SENTINEL: u32 = 0xFFFF_FFFF;

/// Bytes in a legacy metadata record.
pub const LEGACY_METADATA_LEN: usize = 20;

/// Parsed or to-be-written native metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeMetadata {
    pub version: u8,
    pub block_size: u8,
    pub bits_per_pixel: u8,
    pub checksum: u8,
    /// Always 1 for version 1 records, which have no repeat byte.
    pub frame_repeat: u8,
}

impl NativeMetadata {
    /// Current-version record with a freshly computed checksum.
    pub fn new(block_size: u8, bits_per_pixel: u8, frame_repeat: u8) -> Self {
        Self {
            version: FORMAT_VERSION,
            block_size,
            bits_per_pixel,
            checksum: Self::checksum_of(FORMAT_VERSION, block_size, bits_per_pixel),
            frame_repeat,
        }
    }

    pub fn checksum_of(version: u8, block_size: u8, bits_per_pixel: u8) -> u8 {
        version.wrapping_add(block_size).wrapping_add(bits_per_pixel)
    }

    pub fn checksum_valid(&self) -> bool {
        self.checksum == Self::checksum_of(self.version, self.block_size, self.bits_per_pixel)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![self.version, self.block_size, self.bits_per_pixel, self.checksum];
        if self.version >= 2 {
            bytes.push(self.frame_repeat);
        }
        bytes
    }

    /// Parse a record. The checksum is not verified here.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(StreamError::MetadataTruncated(bytes.len()));
        }
        let version = bytes[0];
        let frame_repeat = if version >= 2 {
            *bytes.get(4).ok_or(StreamError::MetadataTruncated(bytes.len()))?
        } else {
            1
        };
        Ok(Self {
            version,
            block_size: bytes[1],
            bits_per_pixel: bytes[2],
            checksum: bytes[3],
            frame_repeat,
        })
    }
}

/// Where the payload ends, as recorded by the legacy profile.
///
/// Frame numbers count the metadata frame as frame 0, so `final_frame` is also
/// the number of data frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamEnd {
    pub final_frame: u32,
    pub final_byte: u32,
}

impl StreamEnd {
    /// Compute the end markers for `input_len` bytes spread over frames of
    /// `frame_bits` payload bits each.
    pub fn for_input(input_len: u64, frame_bits: u64) -> Result<Self> {
        let final_frame = (input_len * 8).div_ceil(frame_bits);
        let final_byte = input_len - Self::bytes_before(final_frame, frame_bits);
        let final_frame = u32::try_from(final_frame)
            .map_err(|_| StreamError::UnsupportedByLegacy("more than 2^32 frames"))?;
        let final_byte = u32::try_from(final_byte)
            .map_err(|_| StreamError::UnsupportedByLegacy("frames holding 4 GiB or more"))?;
        Ok(Self { final_frame, final_byte })
    }

    /// Whole bytes completed by the data frames before the final one.
    fn bytes_before(final_frame: u64, frame_bits: u64) -> u64 {
        final_frame.saturating_sub(1) * frame_bits / 8
    }

    /// Exact payload length in bytes.
    pub fn total_bytes(&self, frame_bits: u64) -> u64 {
        Self::bytes_before(self.final_frame as u64, frame_bits) + self.final_byte as u64
    }

    /// Payload bits stored in the final frame.
    pub fn final_frame_bits(&self, frame_bits: u64) -> u64 {
        let before = (self.final_frame as u64).saturating_sub(1) * frame_bits;
        (self.total_bytes(frame_bits) * 8).saturating_sub(before)
    }

    /// Cells of the final frame that hold payload.
    pub fn final_cell(&self, frame_bits: u64, bits_per_pixel: u32) -> u64 {
        self.final_frame_bits(frame_bits).div_ceil(bits_per_pixel as u64)
    }
}

/// Parsed or to-be-written legacy metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyMetadata {
    pub color_mode: u32,
    pub end: StreamEnd,
    pub block_size: u32,
    pub sentinel: u32,
}

impl LegacyMetadata {
    pub fn new(bits_per_pixel: u32, end: StreamEnd, block_size: u32) -> Result<Self> {
        let color_mode = match bits_per_pixel {
            1 => LEGACY_COLOR_BINARY,
            24 => LEGACY_COLOR_FULL,
            _ => return Err(StreamError::UnsupportedByLegacy("bit depths other than 1 and 24")),
        };
        Ok(Self { color_mode, end, block_size, sentinel: LEGACY_SENTINEL })
    }

    /// Bit depth implied by the colour mode.
    pub fn bits_per_pixel(&self) -> Result<u32> {
        match self.color_mode {
            LEGACY_COLOR_BINARY => Ok(1),
            LEGACY_COLOR_FULL => Ok(24),
            other => Err(StreamError::UnsupportedColorMode(other)),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        [
            self.color_mode,
            self.end.final_frame,
            self.end.final_byte,
            self.block_size,
            self.sentinel,
        ]
        .iter()
        .flat_map(|w| w.to_be_bytes())
        .collect()
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < LEGACY_METADATA_LEN {
            return Err(StreamError::MetadataTruncated(bytes.len()));
        }
        let word = |i: usize| u32::from_be_bytes([bytes[i * 4], bytes[i * 4 + 1], bytes[i * 4 + 2], bytes[i * 4 + 3]]);
        Ok(Self {
            color_mode: word(0),
            end: StreamEnd { final_frame: word(1), final_byte: word(2) },
            block_size: word(3),
            sentinel: word(4),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_roundtrip() {
        let meta = NativeMetadata::new(4, 3, 2);
        assert_eq!(meta.to_bytes(), vec![2, 4, 3, 9, 2]);
        let parsed = NativeMetadata::parse(&meta.to_bytes()).unwrap();
        assert_eq!(parsed, meta);
        assert!(parsed.checksum_valid());
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(NativeMetadata::checksum_of(2, 255, 24), 25);
    }

    #[test]
    fn checksum_catches_any_single_field_change() {
        let bytes = NativeMetadata::new(16, 24, 3).to_bytes();
        for i in 0..3 {
            for delta in 1..=255u8 {
                let mut altered = bytes.clone();
                altered[i] = altered[i].wrapping_add(delta);
                let parsed = NativeMetadata::parse(&altered).unwrap();
                assert!(!parsed.checksum_valid(), "byte {i} delta {delta}");
            }
        }
        // The repeat byte is not covered.
        let mut altered = bytes.clone();
        altered[4] = 9;
        assert!(NativeMetadata::parse(&altered).unwrap().checksum_valid());
    }

    #[test]
    fn version_one_has_no_repeat_byte() {
        let parsed = NativeMetadata::parse(&[1, 4, 1, 6]).unwrap();
        assert_eq!(parsed.frame_repeat, 1);
        assert!(parsed.checksum_valid());
        assert_eq!(parsed.to_bytes(), vec![1, 4, 1, 6]);
    }

    #[test]
    fn truncated_native_rejected() {
        assert!(matches!(NativeMetadata::parse(&[2, 4, 1]), Err(StreamError::MetadataTruncated(3))));
        assert!(matches!(NativeMetadata::parse(&[2, 4, 1, 7]), Err(StreamError::MetadataTruncated(4))));
    }

    #[test]
    fn legacy_layout_is_big_endian_words() {
        let end = StreamEnd { final_frame: 3, final_byte: 0x0102 };
        let meta = LegacyMetadata::new(24, end, 2).unwrap();
        let bytes = meta.to_bytes();
        assert_eq!(bytes.len(), LEGACY_METADATA_LEN);
        assert_eq!(&bytes[0..4], &[0xFF; 4]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 3]);
        assert_eq!(&bytes[8..12], &[0, 0, 1, 2]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 2]);
        assert_eq!(&bytes[16..20], &[0xFF; 4]);
        assert_eq!(LegacyMetadata::parse(&bytes).unwrap(), meta);
    }

    #[test]
    fn legacy_colour_modes() {
        let end = StreamEnd { final_frame: 0, final_byte: 0 };
        assert_eq!(LegacyMetadata::new(1, end, 2).unwrap().bits_per_pixel().unwrap(), 1);
        assert!(LegacyMetadata::new(8, end, 2).is_err());
        let mut meta = LegacyMetadata::new(1, end, 2).unwrap();
        meta.color_mode = 7;
        assert!(matches!(meta.bits_per_pixel(), Err(StreamError::UnsupportedColorMode(7))));
    }

    #[test]
    fn end_markers_for_exact_sizes() {
        // 1000 bits per frame, 125 bytes each.
        let end = StreamEnd::for_input(300, 1000).unwrap();
        assert_eq!(end.final_frame, 3);
        assert_eq!(end.final_byte, 50);
        assert_eq!(end.total_bytes(1000), 300);
        assert_eq!(end.final_frame_bits(1000), 400);

        let end = StreamEnd::for_input(250, 1000).unwrap();
        assert_eq!((end.final_frame, end.final_byte), (2, 125));

        let end = StreamEnd::for_input(0, 1000).unwrap();
        assert_eq!((end.final_frame, end.final_byte), (0, 0));
        assert_eq!(end.total_bytes(1000), 0);
    }

    #[test]
    fn end_markers_with_unaligned_frames() {
        // 12 bits per frame: frame boundaries fall mid-byte.
        for len in 0..40u64 {
            let end = StreamEnd::for_input(len, 12).unwrap();
            assert_eq!(end.final_frame as u64, (len * 8).div_ceil(12));
            assert_eq!(end.total_bytes(12), len);
            assert!(end.final_frame_bits(12) <= 12);
        }
        let end = StreamEnd::for_input(2, 12).unwrap();
        assert_eq!(end.final_cell(12, 1), 4);
    }
}
