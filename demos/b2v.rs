// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Example: store a file in a video and get it back.
//!
//! Needs `ffmpeg` and `ffprobe` in `PATH`. Pass `-v` for frame-level logs.

use std::path::PathBuf;
use std::process;

use bin2video::stream::options::DEFAULT_FRAME_REPEAT;
use bin2video::{decode_file, encode_file, DecodeOptions, EncodeOptions, ProfileKind, TranscodeOptions};

fn usage() -> ! {
    eprintln!("Usage: b2v -e <input> <output.mp4> [options]");
    eprintln!("       b2v -d <input.mp4> <output> [options]");
    eprintln!();
    eprintln!("  -b <n>   bits per pixel, 1..=24 (default 1)");
    eprintln!("  -s <n>   block size in pixels (default 4)");
    eprintln!("  -S <n>   metadata frame block size");
    eprintln!("  -w <n>   frame width (default 1280)");
    eprintln!("  -h <n>   frame height (default 720)");
    eprintln!("  -H <n>   data height, rows below stay black");
    eprintln!("  -r <n>   write every data frame n times (default {DEFAULT_FRAME_REPEAT})");
    eprintln!("  -g       Infinite-Storage-Glitch compatible layout");
    eprintln!("  -k       append a black frame");
    eprintln!("  -v       debug logging");
    process::exit(1);
}

fn number(args: &mut impl Iterator<Item = String>, flag: &str) -> u32 {
    match args.next().and_then(|v| v.parse().ok()) {
        Some(n) => n,
        None => {
            eprintln!("{flag} expects a number");
            usage()
        }
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let decode = match args.next().as_deref() {
        Some("-e") => false,
        Some("-d") => true,
        _ => usage(),
    };
    let (Some(input), Some(output)) = (args.next().map(PathBuf::from), args.next().map(PathBuf::from)) else {
        usage()
    };

    let mut enc = EncodeOptions::default();
    let mut verbose = false;
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "-b" => enc.bits_per_pixel = number(&mut args, "-b"),
            "-s" => enc.block_size = number(&mut args, "-s"),
            "-S" => enc.initial_block_size = Some(number(&mut args, "-S")),
            "-w" => enc.width = number(&mut args, "-w"),
            "-h" => enc.height = number(&mut args, "-h"),
            "-H" => enc.data_height = Some(number(&mut args, "-H")),
            "-r" => enc.frame_repeat = number(&mut args, "-r"),
            "-g" => enc.profile = ProfileKind::Legacy,
            "-k" => enc.black_frame = true,
            "-v" => verbose = true,
            other => {
                eprintln!("unknown option {other}");
                usage()
            }
        }
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .init();

    let transcode = TranscodeOptions::default();
    if decode {
        let dec = DecodeOptions {
            width: enc.width,
            height: enc.height,
            data_height: enc.data_height,
            initial_block_size: enc.initial_block_size,
            profile: enc.profile,
        };
        match decode_file(&input, &output, &dec, &transcode, None) {
            Ok(summary) => println!(
                "Decoded {} bytes from {} frames ({} data frames)",
                summary.bytes_written, summary.frames_read, summary.frames_decoded
            ),
            Err(e) => {
                eprintln!("Decode failed: {e}");
                process::exit(2);
            }
        }
    } else {
        match encode_file(&input, &output, &enc, &transcode, None) {
            Ok(summary) => println!(
                "Encoded {} bytes into {} frames ({} data frames)",
                summary.bytes_read, summary.frames_written, summary.data_frames
            ),
            Err(e) => {
                eprintln!("Encode failed: {e}");
                process::exit(2);
            }
        }
    }
}
