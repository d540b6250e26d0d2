// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Run configuration: defaults, options structs and their validation.

use crate::frame::pixels::MAX_BITS_PER_PIXEL;
use crate::frame::FrameGeometry;

use super::error::{Result, StreamError};
use super::profile::{LegacyProfile, MetadataProfile, NativeProfile};

/// Default video width in pixels.
pub const DEFAULT_WIDTH: u32 = 1280;

/// Default video height in pixels.
pub const DEFAULT_HEIGHT: u32 = 720;

/// Default data depth: black and white cells.
pub const DEFAULT_BITS_PER_PIXEL: u32 = 1;

/// Default data cell size.
pub const DEFAULT_BLOCK_SIZE: u32 = 4;

/// Cell size of the native metadata frame. Decoders must use the same value
/// the encoder used, so change it only together on both sides.
pub const DEFAULT_INITIAL_BLOCK_SIZE: u32 = 8;

/// Cell size of the legacy metadata frame.
pub const LEGACY_INITIAL_BLOCK_SIZE: u32 = 2;

/// Default number of copies of each data frame.
pub const DEFAULT_FRAME_REPEAT: u32 = 1;

/// Largest block size or frame repeat the native metadata can carry.
pub const MAX_METADATA_FIELD: u32 = u8::MAX as u32;

/// Which metadata framing a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileKind {
    /// Versioned, checksummed, length-prefixed framing.
    #[default]
    Native,
    /// Framing compatible with Infinite-Storage-Glitch videos.
    Legacy,
}

impl ProfileKind {
    /// Resolve the profile implementation once for the whole run.
    pub fn select(self) -> Box<dyn MetadataProfile> {
        match self {
            Self::Native => Box::new(NativeProfile),
            Self::Legacy => Box::new(LegacyProfile),
        }
    }

    pub fn default_initial_block_size(self) -> u32 {
        match self {
            Self::Native => DEFAULT_INITIAL_BLOCK_SIZE,
            Self::Legacy => LEGACY_INITIAL_BLOCK_SIZE,
        }
    }
}

/// Parameters of an encode run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Physical frame width in pixels.
    pub width: u32,
    /// Physical frame height in pixels.
    pub height: u32,
    /// Rows carrying cells; the rest of the frame stays black. `None` = full height.
    pub data_height: Option<u32>,
    /// Metadata frame cell size. `None` = profile default.
    pub initial_block_size: Option<u32>,
    pub block_size: u32,
    pub bits_per_pixel: u32,
    /// Copies of each data frame written in a row.
    pub frame_repeat: u32,
    pub profile: ProfileKind,
    /// Append one all-black frame after the last data frame.
    pub black_frame: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            data_height: None,
            initial_block_size: None,
            block_size: DEFAULT_BLOCK_SIZE,
            bits_per_pixel: DEFAULT_BITS_PER_PIXEL,
            frame_repeat: DEFAULT_FRAME_REPEAT,
            profile: ProfileKind::Native,
            black_frame: false,
        }
    }
}

impl EncodeOptions {
    pub fn data_height(&self) -> u32 {
        self.data_height.unwrap_or(self.height)
    }

    pub fn initial_block_size(&self) -> u32 {
        self.initial_block_size
            .unwrap_or_else(|| self.profile.default_initial_block_size())
    }

    /// Check every parameter before any frame is produced.
    ///
    /// # Errors
    /// - [`StreamError::InvalidBitsPerPixel`] outside 1..=24.
    /// - [`StreamError::InvalidBlockSize`] if either block size does not
    ///   divide the frame, or the native metadata cannot carry it.
    /// - [`StreamError::InvalidFrameRepeat`] outside 1..=255.
    /// - [`StreamError::UnsupportedByLegacy`] for legacy runs with a depth
    ///   other than 1 or 24, or with frame repetition.
    pub fn validate(&self) -> Result<()> {
        check_bits_per_pixel(self.bits_per_pixel)?;
        check_block_size(self.initial_block_size(), self.width, self.height, self.data_height())?;
        check_block_size(self.block_size, self.width, self.height, self.data_height())?;
        check_frame_repeat(self.frame_repeat)?;

        match self.profile {
            ProfileKind::Native => {
                if self.block_size > MAX_METADATA_FIELD {
                    return Err(StreamError::InvalidBlockSize {
                        block_size: self.block_size,
                        width: self.width,
                        height: self.height,
                    });
                }
            }
            ProfileKind::Legacy => {
                if self.bits_per_pixel != 1 && self.bits_per_pixel != 24 {
                    return Err(StreamError::UnsupportedByLegacy("bit depths other than 1 and 24"));
                }
                if self.frame_repeat != 1 {
                    return Err(StreamError::UnsupportedByLegacy("frame repetition"));
                }
            }
        }
        Ok(())
    }

    /// Layout of the metadata frame: initial block size, one bit per cell.
    pub fn metadata_geometry(&self) -> Result<FrameGeometry> {
        Ok(FrameGeometry::new(
            self.width,
            self.height,
            self.data_height(),
            self.initial_block_size(),
            1,
        )?)
    }

    /// Layout of every data frame.
    pub fn data_geometry(&self) -> Result<FrameGeometry> {
        Ok(self.metadata_geometry()?.with_cells(self.block_size, self.bits_per_pixel)?)
    }
}

/// Parameters of a decode run. Everything else comes from the metadata frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    pub width: u32,
    pub height: u32,
    /// Must match the encoder's data height. `None` = full height.
    pub data_height: Option<u32>,
    /// Must match the encoder's metadata block size. `None` = profile default.
    pub initial_block_size: Option<u32>,
    pub profile: ProfileKind,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            data_height: None,
            initial_block_size: None,
            profile: ProfileKind::Native,
        }
    }
}

impl DecodeOptions {
    pub fn data_height(&self) -> u32 {
        self.data_height.unwrap_or(self.height)
    }

    pub fn initial_block_size(&self) -> u32 {
        self.initial_block_size
            .unwrap_or_else(|| self.profile.default_initial_block_size())
    }

    pub fn validate(&self) -> Result<()> {
        check_block_size(self.initial_block_size(), self.width, self.height, self.data_height())
    }

    pub fn metadata_geometry(&self) -> Result<FrameGeometry> {
        Ok(FrameGeometry::new(
            self.width,
            self.height,
            self.data_height(),
            self.initial_block_size(),
            1,
        )?)
    }
}

pub(crate) fn check_bits_per_pixel(bits_per_pixel: u32) -> Result<()> {
    if bits_per_pixel == 0 || bits_per_pixel > MAX_BITS_PER_PIXEL as u32 {
        return Err(StreamError::InvalidBitsPerPixel(bits_per_pixel));
    }
    Ok(())
}

pub(crate) fn check_block_size(block_size: u32, width: u32, height: u32, data_height: u32) -> Result<()> {
    if block_size == 0
        || width % block_size != 0
        || height % block_size != 0
        || data_height % block_size != 0
    {
        return Err(StreamError::InvalidBlockSize { block_size, width, height });
    }
    Ok(())
}

pub(crate) fn check_frame_repeat(frame_repeat: u32) -> Result<()> {
    if frame_repeat == 0 || frame_repeat > MAX_METADATA_FIELD {
        return Err(StreamError::InvalidFrameRepeat(frame_repeat));
    }
    Ok(())
}
