// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for frame geometry and buffer handling.

use thiserror::Error;

/// Errors raised while building a frame geometry or handing buffers to the codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Block size is zero or does not evenly divide the frame dimensions.
    #[error("block size {block_size} does not divide frame {width}x{height}")]
    InvalidBlockSize { block_size: u32, width: u32, height: u32 },
    /// Bits per pixel outside 1..=24.
    #[error("bits per pixel must be in 1..=24, got {0}")]
    InvalidBitsPerPixel(u32),
    /// The addressable data region is taller than the frame.
    #[error("data height {data_height} exceeds frame height {height}")]
    InvalidDataHeight { data_height: u32, height: u32 },
    /// The geometry leaves no room for payload cells.
    #[error("frame has {cells} cells, needs more than {reserved}")]
    TooFewCells { cells: usize, reserved: usize },
    /// A physical frame handed to the codec has the wrong byte length.
    #[error("physical frame is {actual} bytes, expected {expected}")]
    FrameSizeMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
