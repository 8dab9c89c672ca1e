// vidprobe-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Vidprobe: media metadata extraction via ffprobe",
    long_about = "Probes media files or piped bytes with ffprobe and prints \
                  container/stream metadata. Can also fetch a local ffmpeg \
                  installation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probes a media file (or stdin) and prints its metadata
    Probe(ProbeArgs),
    /// Downloads and unpacks a platform-specific ffmpeg build
    FetchTools(FetchToolsArgs),
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Media file to probe; omit and pass --stdin to probe piped bytes
    #[arg(value_name = "INPUT", required_unless_present = "stdin")]
    pub input: Option<PathBuf>,

    /// Read the media bytes from stdin instead of a file
    #[arg(long, conflicts_with = "input")]
    pub stdin: bool,

    /// Path to the ffprobe executable (bare names are resolved via PATH)
    #[arg(long, value_name = "FFPROBE", default_value = "ffprobe", env = "VIDPROBE_FFPROBE")]
    pub ffprobe: PathBuf,

    /// Max ffprobe execution time in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    pub timeout: u64,

    /// Print the full metadata document as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct FetchToolsArgs {
    /// Directory the ffmpeg package is downloaded and unpacked into
    #[arg(value_name = "DEST_DIR")]
    pub dest_dir: PathBuf,

    /// ffmpeg release to fetch
    #[arg(long, value_name = "VERSION", default_value = vidprobe_core::DEFAULT_FFMPEG_VERSION)]
    pub version: String,
}
