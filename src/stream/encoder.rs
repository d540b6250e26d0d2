// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Encode driver: bytes in, physical frames out.
//!
//! ```text
//! metadata frame        initial block size, 1 bit per cell, written once
//! data frame × repeat   block size / depth from the options
//! ...
//! black frame           optional
//! ```

use std::io::{self, ErrorKind, Read};
use std::sync::Arc;

use tracing::{debug, info};

use crate::frame::{FrameCodec, FrameError};

use super::error::{Result, StreamError};
use super::options::EncodeOptions;
use super::profile::{MetadataProfile, StreamParams};
use super::progress::Progress;
use super::transport::FrameSink;

/// What an encode run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeSummary {
    /// Frames handed to the sink, metadata and repeats included.
    pub frames_written: u64,
    /// Distinct data frames.
    pub data_frames: u64,
    /// Payload bytes read from the input.
    pub bytes_read: u64,
}

pub struct Encoder {
    options: EncodeOptions,
    profile: Box<dyn MetadataProfile>,
    progress: Option<Arc<Progress>>,
}

impl Encoder {
    pub fn new(options: EncodeOptions) -> Result<Self> {
        options.validate()?;
        let profile = options.profile.select();
        Ok(Self { options, profile, progress: None })
    }

    /// Report to `progress`. Every [`Encoder::encode`] call resets it.
    pub fn with_progress(mut self, progress: Arc<Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Encode `input` into frames written to `sink`.
    ///
    /// `input_len`, when given, must be the exact number of bytes `input`
    /// yields; the legacy profile requires it.
    pub fn encode<R, S>(&self, input: R, input_len: Option<u64>, sink: &mut S) -> Result<EncodeSummary>
    where
        R: Read,
        S: FrameSink + ?Sized,
    {
        let opts = &self.options;
        let order = self.profile.bit_order();
        let reserved = self.profile.reserved_cells();

        let mut data = FrameCodec::new(opts.data_geometry()?, order, reserved)?;
        let params = StreamParams {
            block_size: opts.block_size,
            bits_per_pixel: opts.bits_per_pixel,
            frame_repeat: opts.frame_repeat,
            end: None,
        };
        let metadata = self.profile.build_metadata(&params, input_len, data.frame_bits())?;

        if let Some(p) = &self.progress {
            let total = input_len.map_or(0, |len| {
                let data_frames = (len * 8).div_ceil(data.frame_bits());
                1 + data_frames * opts.frame_repeat as u64 + opts.black_frame as u64
            });
            p.init(total);
        }

        let mut summary = EncodeSummary::default();
        self.write_metadata(&metadata, sink)?;
        summary.frames_written += 1;
        self.tick()?;

        info!(
            width = opts.width,
            height = opts.height,
            block_size = opts.block_size,
            bits_per_pixel = opts.bits_per_pixel,
            frame_repeat = opts.frame_repeat,
            profile = ?opts.profile,
            "streaming data frames"
        );

        let mut input = input.take(input_len.unwrap_or(u64::MAX));
        let mut scratch = Vec::new();
        let mut eof = false;
        loop {
            if !eof {
                let (read, hit_eof) = top_up(&mut data, &mut input, &mut scratch)?;
                summary.bytes_read += read as u64;
                eof = hit_eof;
            }
            if !data.has_pending() {
                break;
            }
            let consumed = data.fill_frame();
            data.slide(consumed);
            for _ in 0..opts.frame_repeat {
                sink.write_frame(data.physical())?;
                summary.frames_written += 1;
                self.tick()?;
            }
            summary.data_frames += 1;
            debug!(frame = summary.data_frames, bytes = summary.bytes_read, "data frame written");
        }

        if let Some(len) = input_len {
            if summary.bytes_read < len {
                return Err(StreamError::Io(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("input ended after {} of {len} bytes", summary.bytes_read),
                )));
            }
        }

        if opts.black_frame {
            sink.write_frame(&vec![0u8; data.geometry().physical_len()])?;
            summary.frames_written += 1;
        }
        sink.flush()?;
        if let Some(p) = &self.progress {
            p.finish();
        }
        info!(frames = summary.frames_written, bytes = summary.bytes_read, "encode finished");
        Ok(summary)
    }

    fn write_metadata<S: FrameSink + ?Sized>(&self, metadata: &[u8], sink: &mut S) -> Result<()> {
        let mut codec = FrameCodec::new(
            self.options.metadata_geometry()?,
            self.profile.bit_order(),
            self.profile.reserved_cells(),
        )?;
        if metadata.len() as u64 * 8 > codec.frame_bits() {
            let g = codec.geometry();
            return Err(FrameError::TooFewCells {
                cells: g.cells_per_frame(),
                reserved: codec.reserved_cells() + metadata.len() * 8,
            }
            .into());
        }
        codec.extend_pending(metadata);
        codec.fill_frame();
        sink.write_frame(codec.physical())?;
        Ok(())
    }

    fn tick(&self) -> Result<()> {
        if let Some(p) = &self.progress {
            p.advance();
            p.check_cancelled()?;
        }
        Ok(())
    }
}

/// Read until the codec's pending buffer is full or the input ends.
///
/// Returns the bytes read and whether the input is exhausted.
fn top_up<R: Read>(codec: &mut FrameCodec, input: &mut R, scratch: &mut Vec<u8>) -> io::Result<(usize, bool)> {
    let room = codec.pending_room();
    scratch.resize(room, 0);
    let mut filled = 0;
    let mut eof = false;
    while filled < room {
        match input.read(&mut scratch[filled..]) {
            Ok(0) => {
                eof = true;
                break;
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    codec.extend_pending(&scratch[..filled]);
    Ok((filled, eof))
}

/// Encode with a one-off [`Encoder`].
pub fn encode_stream<R, S>(input: R, input_len: Option<u64>, sink: &mut S, options: &EncodeOptions) -> Result<EncodeSummary>
where
    R: Read,
    S: FrameSink + ?Sized,
{
    Encoder::new(options.clone())?.encode(input, input_len, sink)
}
