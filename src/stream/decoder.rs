// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Decode driver: physical frames in, bytes out.
//!
//! The decoder starts in [`DecodeState::AwaitingMetadata`] with a codec laid
//! out for the metadata frame. The first received frame is always the
//! metadata frame; parsing it yields the real block size and depth, and a
//! fresh codec for the data frames replaces the metadata codec. In
//! [`DecodeState::Streaming`] only the first copy of each repeated frame is
//! decoded. End of input moves the decoder to [`DecodeState::Done`].

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::frame::{FrameCodec, FrameGeometry};

use super::error::{Result, StreamError};
use super::metadata::StreamEnd;
use super::options::{check_bits_per_pixel, check_block_size, check_frame_repeat, DecodeOptions};
use super::profile::{MetadataProfile, StreamParams};
use super::progress::Progress;
use super::transport::FrameSource;

/// What a decode run recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeSummary {
    /// Physical frames received, metadata and repeats included.
    pub frames_read: u64,
    /// Data frames actually decoded.
    pub frames_decoded: u64,
    /// Payload bytes written to the output.
    pub bytes_written: u64,
    /// Parameters announced by the metadata frame.
    pub params: Option<StreamParams>,
}

/// Decoder state machine.
pub enum DecodeState {
    AwaitingMetadata(FrameCodec),
    Streaming(Streaming),
    Done,
}

/// Working state once the stream parameters are known.
pub struct Streaming {
    codec: FrameCodec,
    params: StreamParams,
    /// Data frames received so far, repeats included.
    received: u64,
    /// Exact payload length, when the profile records it.
    total_bytes: Option<u64>,
}

impl Streaming {
    fn new(codec: FrameCodec, params: StreamParams) -> Self {
        let total_bytes = params.end.map(|end| end.total_bytes(codec.frame_bits()));
        Self { codec, params, received: 0, total_bytes }
    }

    /// Bit cap for logical frame `number` (1-based), or `None` to drop it.
    fn frame_budget(&self, number: u64, end: &StreamEnd) -> Option<Option<u64>> {
        let final_frame = end.final_frame as u64;
        if number > final_frame {
            None
        } else if number == final_frame {
            Some(Some(end.final_frame_bits(self.codec.frame_bits())))
        } else {
            Some(None)
        }
    }
}

pub struct Decoder {
    options: DecodeOptions,
    profile: Box<dyn MetadataProfile>,
    state: DecodeState,
    progress: Option<Arc<Progress>>,
    summary: DecodeSummary,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Result<Self> {
        options.validate()?;
        let profile = options.profile.select();
        let codec = FrameCodec::new(options.metadata_geometry()?, profile.bit_order(), profile.reserved_cells())?;
        Ok(Self {
            options,
            profile,
            state: DecodeState::AwaitingMetadata(codec),
            progress: None,
            summary: DecodeSummary::default(),
        })
    }

    /// Report to `progress`, which is reset for this run. The total stays
    /// unknown until [`Decoder::finish`].
    pub fn with_progress(mut self, progress: Arc<Progress>) -> Self {
        progress.init(0);
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> &DecodeState {
        &self.state
    }

    /// Bytes in one physical frame.
    pub fn frame_len(&self) -> usize {
        self.options.width as usize * self.options.height as usize * 3
    }

    /// Feed the next physical frame. Returns the payload bytes written to `out`.
    pub fn push_frame<W: Write + ?Sized>(&mut self, frame: &[u8], out: &mut W) -> Result<usize> {
        if let Some(p) = &self.progress {
            p.check_cancelled()?;
        }
        self.summary.frames_read += 1;

        let written = match std::mem::replace(&mut self.state, DecodeState::Done) {
            DecodeState::AwaitingMetadata(mut codec) => {
                codec.load_physical(frame)?;
                codec.decode_frame(None);
                let streaming = self.start_streaming(codec.output())?;
                self.state = DecodeState::Streaming(streaming);
                0
            }
            DecodeState::Streaming(mut streaming) => {
                let written = self.decode_data(&mut streaming, frame, out);
                self.state = DecodeState::Streaming(streaming);
                written?
            }
            DecodeState::Done => 0,
        };

        if let Some(p) = &self.progress {
            p.advance();
        }
        Ok(written)
    }

    fn start_streaming(&mut self, metadata: &[u8]) -> Result<Streaming> {
        let params = self.profile.parse_metadata(metadata)?;
        let o = &self.options;
        check_block_size(params.block_size, o.width, o.height, o.data_height())?;
        check_bits_per_pixel(params.bits_per_pixel)?;
        check_frame_repeat(params.frame_repeat)?;

        let geometry = FrameGeometry::new(o.width, o.height, o.data_height(), params.block_size, params.bits_per_pixel)?;
        let codec = FrameCodec::new(geometry, self.profile.bit_order(), self.profile.reserved_cells())?;
        info!(
            block_size = params.block_size,
            bits_per_pixel = params.bits_per_pixel,
            frame_repeat = params.frame_repeat,
            end = ?params.end,
            "metadata frame parsed"
        );
        self.summary.params = Some(params);
        Ok(Streaming::new(codec, params))
    }

    fn decode_data<W: Write + ?Sized>(&mut self, s: &mut Streaming, frame: &[u8], out: &mut W) -> Result<usize> {
        let index = s.received;
        s.received += 1;
        let repeat = s.params.frame_repeat as u64;
        if index % repeat != 0 {
            return Ok(0);
        }
        let number = index / repeat + 1;

        let bit_limit = match &s.params.end {
            Some(end) => match s.frame_budget(number, end) {
                Some(limit) => limit,
                None => {
                    debug!(frame = number, "dropping frame past the recorded end");
                    return Ok(0);
                }
            },
            None => None,
        };

        s.codec.load_physical(frame)?;
        s.codec.decode_frame(bit_limit);
        let mut produced = s.codec.output().len();
        if let Some(total) = s.total_bytes {
            let left = total.saturating_sub(self.summary.bytes_written);
            produced = produced.min(left as usize);
        }
        out.write_all(&s.codec.output()[..produced])?;
        s.codec.clear_output();

        self.summary.frames_decoded += 1;
        self.summary.bytes_written += produced as u64;
        debug!(frame = number, bytes = produced, "data frame decoded");
        Ok(produced)
    }

    /// End of input: move to `Done` and report the run.
    ///
    /// # Errors
    /// [`StreamError::MetadataTruncated`] if not even the metadata frame arrived.
    pub fn finish(mut self) -> Result<DecodeSummary> {
        match std::mem::replace(&mut self.state, DecodeState::Done) {
            DecodeState::AwaitingMetadata(_) => return Err(StreamError::MetadataTruncated(0)),
            DecodeState::Streaming(s) => {
                if let Some(total) = s.total_bytes {
                    if self.summary.bytes_written < total {
                        warn!(
                            expected = total,
                            written = self.summary.bytes_written,
                            "video ended before the recorded payload end"
                        );
                    }
                }
            }
            DecodeState::Done => {}
        }
        if let Some(p) = &self.progress {
            p.finish();
        }
        info!(frames = self.summary.frames_read, bytes = self.summary.bytes_written, "decode finished");
        Ok(self.summary)
    }
}

/// Decode every frame of `source` into `output`.
pub fn decode_stream<S, W>(source: &mut S, output: &mut W, options: &DecodeOptions) -> Result<DecodeSummary>
where
    S: FrameSource + ?Sized,
    W: Write + ?Sized,
{
    run_decoder(Decoder::new(options.clone())?, source, output)
}

/// Drive `decoder` until `source` runs dry.
pub fn run_decoder<S, W>(mut decoder: Decoder, source: &mut S, output: &mut W) -> Result<DecodeSummary>
where
    S: FrameSource + ?Sized,
    W: Write + ?Sized,
{
    let mut frame = vec![0u8; decoder.frame_len()];
    while source.read_frame(&mut frame)? {
        decoder.push_frame(&frame, output)?;
    }
    output.flush()?;
    decoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::encoder::encode_stream;
    use crate::stream::options::{EncodeOptions, ProfileKind};

    fn options(profile: ProfileKind) -> (EncodeOptions, DecodeOptions) {
        let enc = EncodeOptions {
            width: 64,
            height: 32,
            initial_block_size: Some(2),
            block_size: 2,
            profile,
            ..Default::default()
        };
        let dec = DecodeOptions {
            width: 64,
            height: 32,
            initial_block_size: Some(2),
            profile,
            ..Default::default()
        };
        (enc, dec)
    }

    fn decode_frames(frames: &[Vec<u8>], dec: &DecodeOptions) -> Result<(Vec<u8>, DecodeSummary)> {
        let mut decoder = Decoder::new(dec.clone())?;
        let mut out = Vec::new();
        for f in frames {
            decoder.push_frame(f, &mut out)?;
        }
        let summary = decoder.finish()?;
        Ok((out, summary))
    }

    #[test]
    fn state_moves_to_streaming_after_metadata() {
        let (enc, dec) = options(ProfileKind::Native);
        let mut frames: Vec<Vec<u8>> = Vec::new();
        encode_stream(&[1u8, 2, 3][..], None, &mut frames, &enc).unwrap();

        let mut decoder = Decoder::new(dec).unwrap();
        assert!(matches!(decoder.state(), DecodeState::AwaitingMetadata(_)));
        let mut out = Vec::new();
        assert_eq!(decoder.push_frame(&frames[0], &mut out).unwrap(), 0);
        assert!(matches!(decoder.state(), DecodeState::Streaming(_)));
        assert_eq!(decoder.push_frame(&frames[1], &mut out).unwrap(), 3);
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn progress_counts_frames_of_this_run() {
        let (enc, dec) = options(ProfileKind::Native);
        let mut frames: Vec<Vec<u8>> = Vec::new();
        encode_stream(&[9u8; 100][..], None, &mut frames, &enc).unwrap();

        let progress = Arc::new(Progress::new());
        progress.init(10);
        progress.advance();
        progress.cancel();
        let mut decoder = Decoder::new(dec).unwrap().with_progress(progress.clone());
        let mut out = Vec::new();
        for f in &frames {
            decoder.push_frame(f, &mut out).unwrap();
        }
        decoder.finish().unwrap();
        assert_eq!(out, vec![9u8; 100]);
        let n = frames.len() as u64;
        assert_eq!(progress.get(), (n, n));
    }

    #[test]
    fn no_frames_is_an_error() {
        let (_, dec) = options(ProfileKind::Native);
        let decoder = Decoder::new(dec).unwrap();
        assert!(matches!(decoder.finish(), Err(StreamError::MetadataTruncated(0))));
    }

    #[test]
    fn repeated_frames_are_skipped() {
        let (enc, dec) = options(ProfileKind::Native);
        let payload: Vec<u8> = (0..200u8).collect();
        let enc = EncodeOptions { frame_repeat: 4, ..enc };
        let mut frames: Vec<Vec<u8>> = Vec::new();
        encode_stream(&payload[..], None, &mut frames, &enc).unwrap();

        let (out, summary) = decode_frames(&frames, &dec).unwrap();
        assert_eq!(out, payload);
        assert_eq!(summary.frames_read, frames.len() as u64);
        assert_eq!(summary.frames_decoded, (frames.len() as u64 - 1) / 4);
        assert_eq!(summary.params.unwrap().frame_repeat, 4);
    }

    #[test]
    fn bad_block_size_in_metadata_is_fatal() {
        let (_, dec) = options(ProfileKind::Native);
        // Block size 3 does not divide a 64x32 frame.
        let mut meta = FrameCodec::new(
            FrameGeometry::new(64, 32, 32, 2, 1).unwrap(),
            crate::frame::BitOrder::LsbFirst,
            crate::frame::LENGTH_PREFIX_CELLS,
        )
        .unwrap();
        meta.extend_pending(&[2, 3, 1, 6, 1]);
        meta.fill_frame();

        let mut decoder = Decoder::new(dec).unwrap();
        let err = decoder.push_frame(meta.physical(), &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, StreamError::InvalidBlockSize { block_size: 3, .. }));
    }

    #[test]
    fn zero_repeat_in_metadata_is_fatal() {
        let (_, dec) = options(ProfileKind::Native);
        let mut meta = FrameCodec::new(
            FrameGeometry::new(64, 32, 32, 2, 1).unwrap(),
            crate::frame::BitOrder::LsbFirst,
            crate::frame::LENGTH_PREFIX_CELLS,
        )
        .unwrap();
        meta.extend_pending(&[2, 2, 1, 5, 0]);
        meta.fill_frame();

        let mut decoder = Decoder::new(dec).unwrap();
        let err = decoder.push_frame(meta.physical(), &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, StreamError::InvalidFrameRepeat(0)));
    }

    #[test]
    fn legacy_truncates_and_drops_trailing_frames() {
        let (enc, dec) = options(ProfileKind::Legacy);
        let enc = EncodeOptions { black_frame: true, ..enc };
        // 512 bits per frame: 100 bytes span two frames.
        let payload = vec![0xFFu8; 100];
        let mut frames: Vec<Vec<u8>> = Vec::new();
        encode_stream(&payload[..], Some(100), &mut frames, &enc).unwrap();
        assert_eq!(frames.len(), 4);

        let (out, summary) = decode_frames(&frames, &dec).unwrap();
        assert_eq!(out, payload);
        assert_eq!(summary.frames_decoded, 2);
        let end = summary.params.unwrap().end.unwrap();
        assert_eq!((end.final_frame, end.final_byte), (2, 36));
    }
}
