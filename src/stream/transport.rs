// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Frame transport: fixed-size RGB24 frames over byte streams.
//!
//! Pipes deliver frames in arbitrary chunks. [`RawFrameReader`] keeps reading
//! until a whole frame is buffered; a trailing short read is not a frame.

use std::io::{self, ErrorKind, Read, Write};

use tracing::warn;

/// Source of physical frames.
pub trait FrameSource {
    /// Fill `frame` with the next frame. Returns `false` at end of stream.
    fn read_frame(&mut self, frame: &mut [u8]) -> io::Result<bool>;
}

/// Destination for physical frames.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reads back-to-back raw frames from a byte stream.
pub struct RawFrameReader<R> {
    inner: R,
}

impl<R: Read> RawFrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> FrameSource for RawFrameReader<R> {
    fn read_frame(&mut self, frame: &mut [u8]) -> io::Result<bool> {
        let mut filled = 0;
        while filled < frame.len() {
            match self.inner.read(&mut frame[filled..]) {
                Ok(0) => {
                    if filled > 0 {
                        warn!(bytes = filled, expected = frame.len(), "discarding partial trailing frame");
                    }
                    return Ok(false);
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}

/// Writes raw frames back to back into a byte stream.
pub struct RawFrameWriter<W: Write> {
    inner: W,
}

impl<W: Write> RawFrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> FrameSink for RawFrameWriter<W> {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.inner.write_all(frame)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Collects frames in memory.
impl FrameSink for Vec<Vec<u8>> {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.push(frame.to_vec());
        Ok(())
    }
}
