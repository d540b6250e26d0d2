// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Frame codec: bytes ↔ fixed-size RGB24 frames.
//!
//! This module performs no I/O. It packs a byte stream into data cells
//! (`bitio` → `pixels` → `scale`) and recovers it from received frames
//! (`scale` → `pixels` → `bitio`). Stream-level concerns such as metadata,
//! frame repetition and transport live in [`crate::stream`].

pub mod bitio;
pub mod codec;
pub mod error;
pub mod geometry;
pub mod pixels;
pub mod scale;

pub use bitio::BitOrder;
pub use codec::{FrameCodec, LENGTH_PREFIX_CELLS};
pub use error::FrameError;
pub use geometry::FrameGeometry;
pub use pixels::PixelFormat;
