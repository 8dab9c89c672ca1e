//! Media metadata model
//!
//! Data structures mirroring the JSON document ffprobe emits with
//! `-print_format json -show_format -show_streams`, plus typed accessors
//! for the numeric fields the tool encodes as strings.

pub mod info;

// Re-export commonly used types
pub use info::{Disposition, FormatInfo, MediaInfo, StreamInfo};
