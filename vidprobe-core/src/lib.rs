//! Core library for probing media files with ffprobe.
//!
//! This crate wraps an external ffprobe executable to extract
//! container/stream metadata from video files or in-memory byte buffers,
//! bounded by a hard timeout and interruptible through a cooperative
//! cancellation token. It also provisions a local ffmpeg installation by
//! downloading and unpacking a platform-specific build package.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use vidprobe_core::{CancellationToken, VideoAnalyzer};
//!
//! let analyzer = VideoAnalyzer::new("ffmpeg/bin/ffprobe");
//! let cancel = CancellationToken::new();
//!
//! let info = analyzer.analyze_file("sample.mp4", &cancel).unwrap();
//! if let Some(format) = &info.format {
//!     println!(
//!         "{}: {:?} s",
//!         format.format_name.as_deref().unwrap_or("unknown"),
//!         format.duration_secs()
//!     );
//! }
//! ```

pub mod analyzer;
pub mod cancel;
pub mod error;
pub mod media;
pub mod provision;
pub mod validation;

// Re-exports for public API
pub use analyzer::{MediaInput, VideoAnalyzer, DEFAULT_TIMEOUT};
pub use cancel::CancellationToken;
pub use error::{CoreError, CoreResult};
pub use media::{Disposition, FormatInfo, MediaInfo, StreamInfo};
pub use provision::{FfmpegProvisioner, ProvisionedTools, DEFAULT_FFMPEG_VERSION};
pub use validation::{is_reachable, is_url};
