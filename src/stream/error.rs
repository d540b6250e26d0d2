// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the encode/decode pipelines.
//!
//! Only fatal conditions are errors. Advisory problems with a metadata frame
//! (checksum mismatch, unknown version) are logged and decoding continues.

use thiserror::Error;

use crate::frame::FrameError;

/// Errors that abort an encode or decode run.
#[derive(Debug, Error)]
pub enum StreamError {
    /// I/O error on the input, output or transcoder pipes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame geometry could not be built or a frame had the wrong size.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Block size is zero, too large for the metadata, or does not divide the frame.
    #[error("block size {block_size} is invalid for a {width}x{height} frame")]
    InvalidBlockSize { block_size: u32, width: u32, height: u32 },

    /// Bits per pixel outside 1..=24.
    #[error("bits per pixel must be in 1..=24, got {0}")]
    InvalidBitsPerPixel(u32),

    /// Frame repeat below 1 (or above what the metadata can carry).
    #[error("frame repeat must be in 1..=255, got {0}")]
    InvalidFrameRepeat(u32),

    /// The metadata frame did not carry enough bytes to parse.
    #[error("metadata frame truncated: {0} bytes")]
    MetadataTruncated(usize),

    /// Legacy colour mode other than binary or full colour.
    #[error("unsupported legacy colour mode 0x{0:08X}")]
    UnsupportedColorMode(u32),

    /// The legacy profile only knows 1 and 24 bits per pixel and no repetition.
    #[error("legacy profile does not support {0}")]
    UnsupportedByLegacy(&'static str),

    /// The legacy profile needs the exact input size up front.
    #[error("legacy profile requires a known input length")]
    MissingInputLength,

    /// The transcoder or prober could not be started or exited unsuccessfully.
    #[error("transcoder failed: {0}")]
    Transcoder(String),

    /// The prober output did not contain a usable resolution.
    #[error("could not determine video resolution: {0}")]
    Probe(String),

    /// The run was cancelled through its progress handle.
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type alias using StreamError.
pub type Result<T> = std::result::Result<T, StreamError>;
