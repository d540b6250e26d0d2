// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Metadata profiles.
//!
//! A profile decides how the first frame describes the stream, which bit
//! order the payload uses, and whether frames carry a length prefix. It is
//! picked once per run through [`super::options::ProfileKind::select`].

use tracing::warn;

use crate::frame::{BitOrder, LENGTH_PREFIX_CELLS};

use super::error::{Result, StreamError};
use super::metadata::{LegacyMetadata, NativeMetadata, StreamEnd, FORMAT_VERSION, LEGACY_SENTINEL};

/// Stream parameters announced by (or recovered from) the metadata frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub block_size: u32,
    pub bits_per_pixel: u32,
    pub frame_repeat: u32,
    /// Exact payload end, known only to the legacy profile.
    pub end: Option<StreamEnd>,
}

/// Metadata framing shared by encoder and decoder.
pub trait MetadataProfile {
    /// Bit order of the metadata and of every data frame.
    fn bit_order(&self) -> BitOrder;

    /// Leading cells of every frame set aside for the length prefix.
    fn reserved_cells(&self) -> usize;

    /// Serialize the metadata record.
    ///
    /// `input_len` is the exact payload size when known and `frame_bits` the
    /// payload capacity of one data frame.
    fn build_metadata(&self, params: &StreamParams, input_len: Option<u64>, frame_bits: u64) -> Result<Vec<u8>>;

    /// Parse the bytes decoded from the metadata frame.
    ///
    /// Advisory problems are logged; only unusable records are errors.
    fn parse_metadata(&self, bytes: &[u8]) -> Result<StreamParams>;
}

/// Versioned, checksummed framing with a length prefix in every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeProfile;

impl MetadataProfile for NativeProfile {
    fn bit_order(&self) -> BitOrder {
        BitOrder::LsbFirst
    }

    fn reserved_cells(&self) -> usize {
        LENGTH_PREFIX_CELLS
    }

    fn build_metadata(&self, params: &StreamParams, _input_len: Option<u64>, _frame_bits: u64) -> Result<Vec<u8>> {
        let field = |v: u32, err: StreamError| u8::try_from(v).map_err(|_| err);
        let block_size = field(
            params.block_size,
            StreamError::InvalidBlockSize { block_size: params.block_size, width: 0, height: 0 },
        )?;
        let bits_per_pixel = field(params.bits_per_pixel, StreamError::InvalidBitsPerPixel(params.bits_per_pixel))?;
        let frame_repeat = field(params.frame_repeat, StreamError::InvalidFrameRepeat(params.frame_repeat))?;
        Ok(NativeMetadata::new(block_size, bits_per_pixel, frame_repeat).to_bytes())
    }

    fn parse_metadata(&self, bytes: &[u8]) -> Result<StreamParams> {
        let meta = NativeMetadata::parse(bytes)?;
        if !meta.checksum_valid() {
            warn!(
                stored = meta.checksum,
                computed = NativeMetadata::checksum_of(meta.version, meta.block_size, meta.bits_per_pixel),
                "metadata checksum mismatch, continuing"
            );
        }
        if meta.version == 0 || meta.version > FORMAT_VERSION {
            warn!(version = meta.version, supported = FORMAT_VERSION, "unsupported metadata version, continuing");
        }
        Ok(StreamParams {
            block_size: meta.block_size as u32,
            bits_per_pixel: meta.bits_per_pixel as u32,
            frame_repeat: meta.frame_repeat as u32,
            end: None,
        })
    }
}

/// Fixed framing compatible with Infinite-Storage-Glitch videos: MSB-first
/// bits, no length prefix, explicit end markers instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyProfile;

impl MetadataProfile for LegacyProfile {
    fn bit_order(&self) -> BitOrder {
        BitOrder::MsbFirst
    }

    fn reserved_cells(&self) -> usize {
        0
    }

    fn build_metadata(&self, params: &StreamParams, input_len: Option<u64>, frame_bits: u64) -> Result<Vec<u8>> {
        let input_len = input_len.ok_or(StreamError::MissingInputLength)?;
        let end = StreamEnd::for_input(input_len, frame_bits)?;
        Ok(LegacyMetadata::new(params.bits_per_pixel, end, params.block_size)?.to_bytes())
    }

    fn parse_metadata(&self, bytes: &[u8]) -> Result<StreamParams> {
        let meta = LegacyMetadata::parse(bytes)?;
        if meta.sentinel != LEGACY_SENTINEL {
            warn!(sentinel = meta.sentinel, "legacy metadata sentinel mismatch, continuing");
        }
        Ok(StreamParams {
            block_size: meta.block_size,
            bits_per_pixel: meta.bits_per_pixel()?,
            frame_repeat: 1,
            end: Some(meta.end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(block_size: u32, bits_per_pixel: u32, frame_repeat: u32) -> StreamParams {
        StreamParams { block_size, bits_per_pixel, frame_repeat, end: None }
    }

    #[test]
    fn native_build_parse() {
        let p = params(4, 12, 3);
        let bytes = NativeProfile.build_metadata(&p, None, 0).unwrap();
        assert_eq!(NativeProfile.parse_metadata(&bytes).unwrap(), p);
    }

    #[test]
    fn native_checksum_mismatch_is_not_fatal() {
        let mut bytes = NativeProfile.build_metadata(&params(4, 1, 1), None, 0).unwrap();
        bytes[3] ^= 0x10;
        let parsed = NativeProfile.parse_metadata(&bytes).unwrap();
        assert_eq!(parsed.block_size, 4);
    }

    #[test]
    fn native_future_version_is_not_fatal() {
        let bytes = [9, 4, 2, 15, 1];
        let parsed = NativeProfile.parse_metadata(&bytes).unwrap();
        assert_eq!(parsed, params(4, 2, 1));
    }

    #[test]
    fn native_rejects_unrepresentable_fields() {
        assert!(matches!(
            NativeProfile.build_metadata(&params(256, 1, 1), None, 0),
            Err(StreamError::InvalidBlockSize { block_size: 256, .. })
        ));
        assert!(matches!(
            NativeProfile.build_metadata(&params(4, 1, 300), None, 0),
            Err(StreamError::InvalidFrameRepeat(300))
        ));
    }

    #[test]
    fn legacy_needs_length() {
        assert!(matches!(
            LegacyProfile.build_metadata(&params(2, 1, 1), None, 1000),
            Err(StreamError::MissingInputLength)
        ));
    }

    #[test]
    fn legacy_build_parse() {
        let bytes = LegacyProfile.build_metadata(&params(2, 24, 1), Some(10_000), 24_000).unwrap();
        let parsed = LegacyProfile.parse_metadata(&bytes).unwrap();
        assert_eq!(parsed.block_size, 2);
        assert_eq!(parsed.bits_per_pixel, 24);
        assert_eq!(parsed.frame_repeat, 1);
        let end = parsed.end.unwrap();
        assert_eq!(end.final_frame, 4);
        assert_eq!(end.total_bytes(24_000), 10_000);
    }

    #[test]
    fn legacy_unknown_colour_mode_is_fatal() {
        let mut bytes = LegacyProfile.build_metadata(&params(2, 1, 1), Some(1), 1000).unwrap();
        bytes[3] = 1;
        assert!(matches!(LegacyProfile.parse_metadata(&bytes), Err(StreamError::UnsupportedColorMode(1))));
    }

    #[test]
    fn profiles_differ_in_framing() {
        assert_eq!(NativeProfile.reserved_cells(), LENGTH_PREFIX_CELLS);
        assert_eq!(LegacyProfile.reserved_cells(), 0);
        assert_eq!(NativeProfile.bit_order(), BitOrder::LsbFirst);
        assert_eq!(LegacyProfile.bit_order(), BitOrder::MsbFirst);
    }
}
