// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! # bin2video
//!
//! Stores arbitrary binary data as a sequence of synthetic RGB24 video frames
//! and recovers it from those frames. Each frame is a grid of square cells;
//! every cell carries 1 to 24 bits through the intensity of its red, green
//! and blue components, so the data survives mild lossy compression when the
//! cells are large and the depth is low.
//!
//! - [`frame`] packs bytes into cells and back. No I/O.
//! - [`stream`] adds the metadata frame, frame repetition, raw-frame
//!   transport and the `ffmpeg` glue.
//!
//! The codec is single-threaded and streams: memory use is bounded by a few
//! frames regardless of the payload size.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use bin2video::{decode_stream, encode_stream, DecodeOptions, EncodeOptions};
//!
//! let payload = std::fs::read("archive.tar").unwrap();
//! let mut frames: Vec<Vec<u8>> = Vec::new();
//! encode_stream(&payload[..], None, &mut frames, &EncodeOptions::default()).unwrap();
//!
//! let stream = frames.concat();
//! let mut source = bin2video::RawFrameReader::new(&stream[..]);
//! let mut out = Vec::new();
//! decode_stream(&mut source, &mut out, &DecodeOptions::default()).unwrap();
//! assert_eq!(out, payload);
//! ```

pub mod frame;
pub mod stream;

pub use frame::{BitOrder, FrameCodec, FrameError, FrameGeometry, PixelFormat};
pub use stream::{decode_stream, encode_stream, DecodeOptions, DecodeSummary, Decoder, EncodeOptions, EncodeSummary, Encoder};
pub use stream::{decode_file, encode_file, TranscodeOptions};
pub use stream::{FrameSink, FrameSource, RawFrameReader, RawFrameWriter};
pub use stream::{ProfileKind, Progress, StreamError, StreamParams};
