// vidprobe-cli/src/commands/probe.rs
//
// The `probe` subcommand: runs the analyzer against a file or stdin bytes
// and prints a summary or the raw metadata document.

use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use log::debug;
use vidprobe_core::{CancellationToken, MediaInfo, VideoAnalyzer};

use crate::cli::ProbeArgs;

pub fn run_probe(args: &ProbeArgs) -> anyhow::Result<()> {
    let ffprobe = resolve_ffprobe(&args.ffprobe);
    let analyzer = VideoAnalyzer::with_timeout(ffprobe, Duration::from_millis(args.timeout));
    let cancel = CancellationToken::new();

    let info = if args.stdin {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("reading media bytes from stdin")?;
        analyzer.analyze_bytes(&data, &cancel)?
    } else {
        // clap guarantees input is present when --stdin is absent
        let input = args.input.as_deref().expect("input path");
        analyzer.analyze_file(input, &cancel)?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_summary(&info);
    }
    Ok(())
}

/// A bare executable name is looked up on PATH; anything with a directory
/// component is used as given. The analyzer itself only accepts a concrete
/// file path.
fn resolve_ffprobe(configured: &Path) -> PathBuf {
    if configured.components().count() > 1 || configured.is_file() {
        return configured.to_path_buf();
    }
    if let Some(paths) = env::var_os("PATH") {
        for dir in env::split_paths(&paths) {
            let candidate = dir.join(configured);
            if candidate.is_file() {
                debug!("Resolved ffprobe to {}", candidate.display());
                return candidate;
            }
        }
    }
    configured.to_path_buf()
}

fn print_summary(info: &MediaInfo) {
    if let Some(format) = &info.format {
        println!("Container: {}", format.format_name.as_deref().unwrap_or("?"));
        if let Some(duration) = format.duration_secs() {
            println!("Duration:  {duration:.3} s");
        }
        if let Some(size) = format.size_bytes() {
            println!("Size:      {size} bytes");
        }
        if let Some(bit_rate) = format.bit_rate_bps() {
            println!("Bit rate:  {bit_rate} b/s");
        }
        if let Some(score) = format.probe_score {
            println!("Probe score: {score}");
        }
    }
    for stream in info.streams.iter().flatten() {
        let index = stream.index.unwrap_or_default();
        let kind = stream.codec_type.as_deref().unwrap_or("?");
        let codec = stream.codec_name.as_deref().unwrap_or("?");
        match (stream.width, stream.height, stream.channels) {
            (Some(w), Some(h), _) => println!("Stream #{index} {kind}: {codec} {w}x{h}"),
            (_, _, Some(ch)) => println!("Stream #{index} {kind}: {codec} {ch}ch"),
            _ => println!("Stream #{index} {kind}: {codec}"),
        }
    }
}
