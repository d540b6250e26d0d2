// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Stream layer: metadata frame, frame repetition, transport and drivers.
//!
//! A bin2video stream is one metadata frame followed by data frames:
//!
//! - The **metadata frame** is always written with one bit per cell at the
//!   initial block size, so a decoder can read it before knowing anything
//!   else about the stream.
//! - **Data frames** use the announced block size and bit depth. Each may be
//!   written `frame_repeat` times; the decoder keeps the first copy.
//!
//! Two metadata profiles exist. The native profile (`ProfileKind::Native`)
//! records version, checksum and repetition and prefixes every data frame
//! with its payload length. The legacy profile (`ProfileKind::Legacy`) reads
//! and writes videos in the Infinite-Storage-Glitch layout.

pub mod error;
pub mod options;
pub mod metadata;
pub mod profile;
pub mod transport;
pub mod progress;
pub mod encoder;
pub mod decoder;
pub mod ffmpeg;

pub use error::StreamError;
pub use options::{DecodeOptions, EncodeOptions, ProfileKind};
pub use profile::{LegacyProfile, MetadataProfile, NativeProfile, StreamParams};
pub use metadata::StreamEnd;
pub use transport::{FrameSink, FrameSource, RawFrameReader, RawFrameWriter};
pub use progress::Progress;
pub use encoder::{encode_stream, EncodeSummary, Encoder};
pub use decoder::{decode_stream, run_decoder, DecodeState, DecodeSummary, Decoder};
pub use ffmpeg::{decode_file, encode_file, TranscodeOptions};
