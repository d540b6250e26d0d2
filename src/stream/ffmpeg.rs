// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! External transcoder glue.
//!
//! Raw RGB24 frames are piped into `ffmpeg` for encoding and read back from
//! it for decoding; `ffprobe` supplies the resolution of an existing video.
//! The codec itself never touches these processes, it only sees a
//! [`FrameSink`](super::transport::FrameSink) or
//! [`FrameSource`](super::transport::FrameSource).

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;

use tracing::{debug, info};

use super::decoder::{run_decoder, DecodeSummary, Decoder};
use super::encoder::{EncodeSummary, Encoder};
use super::error::{Result, StreamError};
use super::options::{DecodeOptions, EncodeOptions};
use super::progress::Progress;
use super::transport::{RawFrameReader, RawFrameWriter};

/// Frame rate of produced videos.
pub const DEFAULT_FRAMERATE: u32 = 30;

/// How to run the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOptions {
    /// `ffmpeg` executable, looked up in `PATH` unless absolute.
    pub ffmpeg: OsString,
    /// `ffprobe` executable.
    pub ffprobe: OsString,
    pub framerate: u32,
    /// Output codec arguments placed between the raw input and the output path.
    pub encoder_args: Vec<OsString>,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
            framerate: DEFAULT_FRAMERATE,
            encoder_args: ["-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart"]
                .iter()
                .map(OsString::from)
                .collect(),
        }
    }
}

impl TranscodeOptions {
    /// Arguments for turning raw frames on stdin into `output`.
    pub fn encode_args(&self, output: &Path, width: u32, height: u32) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-v".into(),
            "error".into(),
            "-y".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgb24".into(),
            "-s".into(),
            format!("{width}x{height}").into(),
            "-framerate".into(),
            self.framerate.to_string().into(),
            "-i".into(),
            "-".into(),
        ];
        args.extend(self.encoder_args.iter().cloned());
        args.push(output.into());
        args
    }

    /// Arguments for turning `input` into raw frames on stdout.
    pub fn decode_args(&self, input: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-v".into(),
            "error".into(),
            "-i".into(),
            input.into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgb24".into(),
            "-".into(),
        ]
    }

    /// Arguments for printing the first video stream's size as `WxH`.
    pub fn probe_args(&self, input: &Path) -> Vec<OsString> {
        vec![
            "-v".into(),
            "error".into(),
            "-select_streams".into(),
            "v:0".into(),
            "-show_entries".into(),
            "stream=width,height".into(),
            "-of".into(),
            "csv=s=x:p=0".into(),
            input.into(),
        ]
    }

    /// Resolution of the first video stream of `input`.
    pub fn probe_resolution(&self, input: &Path) -> Result<(u32, u32)> {
        let output = Command::new(&self.ffprobe)
            .args(self.probe_args(input))
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| StreamError::Transcoder(format!("couldn't spawn {:?}: {e}", self.ffprobe)))?;
        if !output.status.success() {
            return Err(StreamError::Probe(format!("ffprobe exited with {}", output.status)));
        }
        parse_resolution(&String::from_utf8_lossy(&output.stdout))
    }

    fn spawn(&self, args: Vec<OsString>, stdin: Stdio, stdout: Stdio) -> Result<Child> {
        debug!(program = ?self.ffmpeg, ?args, "spawning transcoder");
        Command::new(&self.ffmpeg)
            .args(args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| StreamError::Transcoder(format!("couldn't spawn {:?}: {e}", self.ffmpeg)))
    }
}

/// Parse `WxH` as printed by ffprobe. Trailing separators and extra lines are ignored.
pub fn parse_resolution(text: &str) -> Result<(u32, u32)> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| StreamError::Probe("empty prober output".into()))?;
    let line = line.trim_end_matches('x');
    let (w, h) = line
        .split_once('x')
        .ok_or_else(|| StreamError::Probe(format!("unexpected prober output {line:?}")))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|_| StreamError::Probe(format!("unexpected prober output {line:?}")))
    };
    let (width, height) = (parse(w)?, parse(h)?);
    if width == 0 || height == 0 {
        return Err(StreamError::Probe(format!("zero-sized video {width}x{height}")));
    }
    Ok((width, height))
}

/// Wait for `child`, turning a failed exit into an error.
fn reap(mut child: Child) -> Result<()> {
    let status = child.wait()?;
    if !status.success() {
        return Err(StreamError::Transcoder(format!("ffmpeg exited with {status}")));
    }
    Ok(())
}

/// Kill `child` after a pipeline error and pass the error on.
fn abort<T>(mut child: Child, err: StreamError) -> Result<T> {
    let _ = child.kill();
    let _ = child.wait();
    Err(err)
}

/// Encode the file at `input` into the video `output`.
pub fn encode_file(
    input: &Path,
    output: &Path,
    options: &EncodeOptions,
    transcode: &TranscodeOptions,
    progress: Option<Arc<Progress>>,
) -> Result<EncodeSummary> {
    let mut encoder = Encoder::new(options.clone())?;
    if let Some(p) = progress {
        encoder = encoder.with_progress(p);
    }
    let file = File::open(input)?;
    let len = file.metadata()?.len();
    info!(input = %input.display(), output = %output.display(), bytes = len, "encoding file");

    let mut child = transcode.spawn(
        transcode.encode_args(output, options.width, options.height),
        Stdio::piped(),
        Stdio::null(),
    )?;
    let Some(stdin) = child.stdin.take() else {
        return abort(child, StreamError::Transcoder("transcoder stdin unavailable".into()));
    };

    let mut sink = RawFrameWriter::new(BufWriter::new(stdin));
    let summary = match encoder.encode(BufReader::new(file), Some(len), &mut sink) {
        Ok(s) => s,
        Err(e) => return abort(child, e),
    };
    // Closing stdin lets the transcoder finish the container.
    drop(sink);
    reap(child)?;
    Ok(summary)
}

/// Decode the video at `input` into the file `output`.
///
/// The frame size comes from the prober; `options.width`/`height` are
/// overwritten.
pub fn decode_file(
    input: &Path,
    output: &Path,
    options: &DecodeOptions,
    transcode: &TranscodeOptions,
    progress: Option<Arc<Progress>>,
) -> Result<DecodeSummary> {
    let (width, height) = transcode.probe_resolution(input)?;
    let options = DecodeOptions { width, height, ..options.clone() };
    let mut decoder = Decoder::new(options)?;
    if let Some(p) = progress {
        decoder = decoder.with_progress(p);
    }
    info!(input = %input.display(), output = %output.display(), width, height, "decoding video");

    let mut out = BufWriter::new(File::create(output)?);
    let mut child = transcode.spawn(transcode.decode_args(input), Stdio::null(), Stdio::piped())?;
    let Some(stdout) = child.stdout.take() else {
        return abort(child, StreamError::Transcoder("transcoder stdout unavailable".into()));
    };

    let mut source = RawFrameReader::new(stdout);
    let summary = match run_decoder(decoder, &mut source, &mut out) {
        Ok(s) => s,
        Err(e) => return abort(child, e),
    };
    out.flush()?;
    reap(child)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_probe_output() {
        assert_eq!(parse_resolution("1280x720\n").unwrap(), (1280, 720));
        assert_eq!(parse_resolution("\n 640x360x\n").unwrap(), (640, 360));
        assert!(matches!(parse_resolution(""), Err(StreamError::Probe(_))));
        assert!(matches!(parse_resolution("N/A"), Err(StreamError::Probe(_))));
        assert!(matches!(parse_resolution("0x720"), Err(StreamError::Probe(_))));
    }

    #[test]
    fn encode_args_describe_raw_input() {
        let t = TranscodeOptions::default();
        let args = t.encode_args(Path::new("out.mp4"), 1280, 720);
        let text: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        let pos = |s: &str| text.iter().position(|a| a == s).unwrap();
        assert_eq!(text[pos("-s") + 1], "1280x720");
        assert_eq!(text[pos("-pix_fmt") + 1], "rgb24");
        assert_eq!(text[pos("-framerate") + 1], "30");
        assert!(pos("-i") < pos("libx264"));
        assert_eq!(text.last().unwrap(), "out.mp4");
    }

    #[test]
    fn custom_encoder_args_replace_defaults() {
        let t = TranscodeOptions {
            encoder_args: vec!["-c:v".into(), "ffv1".into()],
            framerate: 24,
            ..Default::default()
        };
        let text: Vec<String> = t
            .encode_args(Path::new("a.mkv"), 64, 32)
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(text.contains(&"ffv1".to_string()));
        assert!(!text.contains(&"libx264".to_string()));
        assert!(text.contains(&"24".to_string()));
    }

    #[test]
    fn decode_args_emit_raw_rgb() {
        let t = TranscodeOptions::default();
        let text: Vec<String> = t
            .decode_args(Path::new("in.mp4"))
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(text.last().unwrap(), "-");
        assert!(text.windows(2).any(|w| w[0] == "-i" && w[1] == "in.mp4"));
        assert!(text.windows(2).any(|w| w[0] == "-pix_fmt" && w[1] == "rgb24"));
    }

    #[test]
    fn missing_tool_is_a_transcoder_error() {
        let t = TranscodeOptions { ffprobe: "/nonexistent/ffprobe-b2v".into(), ..Default::default() };
        assert!(matches!(
            t.probe_resolution(Path::new("x.mp4")),
            Err(StreamError::Transcoder(_))
        ));
    }
}
