use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Complete media information parsed from ffprobe's JSON output.
///
/// Both fields are optional: ffprobe omits the sections it cannot fill in.
/// A document carrying neither section is treated by the analyzer as the
/// tool having produced no usable output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Container-level information (`format` section)
    pub format: Option<FormatInfo>,

    /// One entry per elementary stream, in stream-index order
    pub streams: Option<Vec<StreamInfo>>,
}

impl MediaInfo {
    /// True when neither container nor stream information was produced.
    pub fn is_empty(&self) -> bool {
        self.format.is_none() && self.streams.is_none()
    }

    /// All video streams, in order.
    pub fn video_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams.iter().flatten().filter(|s| s.is_video())
    }

    /// All audio streams, in order.
    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams.iter().flatten().filter(|s| s.is_audio())
    }
}

/// Container-level information.
///
/// ffprobe encodes several numeric fields (duration, size, bit_rate,
/// start_time) as JSON strings; they are kept verbatim here and converted
/// on demand through the typed accessors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatInfo {
    pub filename: Option<String>,
    pub nb_streams: Option<i64>,
    pub nb_programs: Option<i64>,
    pub format_name: Option<String>,
    pub format_long_name: Option<String>,
    pub start_time: Option<String>,
    pub duration: Option<String>,
    pub size: Option<String>,
    pub bit_rate: Option<String>,
    /// Probe confidence 0-100. 100 means ffprobe is certain about the
    /// detected format; below 25 a longer probe is advisable.
    pub probe_score: Option<i64>,
    pub tags: Option<HashMap<String, String>>,
}

impl FormatInfo {
    /// Container duration in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration.as_deref().and_then(|d| d.parse().ok())
    }

    /// Container start time in seconds.
    pub fn start_time_secs(&self) -> Option<f64> {
        self.start_time.as_deref().and_then(|t| t.parse().ok())
    }

    /// File size in bytes.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }

    /// Overall bit rate in bits per second.
    pub fn bit_rate_bps(&self) -> Option<u64> {
        self.bit_rate.as_deref().and_then(|b| b.parse().ok())
    }
}

/// One elementary stream (video, audio, subtitle, data, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamInfo {
    pub index: Option<i64>,
    pub codec_name: Option<String>,
    pub codec_long_name: Option<String>,
    pub profile: Option<String>,
    /// Stream kind as reported by ffprobe ("video", "audio", ...)
    pub codec_type: Option<String>,
    pub codec_tag_string: Option<String>,
    pub codec_tag: Option<String>,

    // ---- Video ----
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub coded_width: Option<i64>,
    pub coded_height: Option<i64>,
    pub has_b_frames: Option<i64>,
    pub sample_aspect_ratio: Option<String>,
    pub display_aspect_ratio: Option<String>,
    pub pix_fmt: Option<String>,
    pub level: Option<i64>,
    pub color_range: Option<String>,
    pub color_space: Option<String>,
    pub color_transfer: Option<String>,
    pub color_primaries: Option<String>,
    pub chroma_location: Option<String>,
    pub refs: Option<i64>,
    pub is_avc: Option<String>,
    pub nal_length_size: Option<String>,

    // ---- Timing ----
    pub r_frame_rate: Option<String>,
    pub avg_frame_rate: Option<String>,
    pub time_base: Option<String>,
    pub start_pts: Option<i64>,
    pub start_time: Option<String>,
    pub duration_ts: Option<i64>,
    pub duration: Option<String>,
    pub bit_rate: Option<String>,
    pub bits_per_raw_sample: Option<String>,
    pub nb_frames: Option<String>,

    // ---- Audio ----
    pub sample_fmt: Option<String>,
    pub sample_rate: Option<String>,
    pub channels: Option<i64>,
    pub channel_layout: Option<String>,
    pub bits_per_sample: Option<i64>,

    pub disposition: Option<Disposition>,
    pub tags: Option<HashMap<String, String>>,
}

impl StreamInfo {
    pub fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }

    pub fn is_audio(&self) -> bool {
        self.codec_type.as_deref() == Some("audio")
    }

    /// Stream duration in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration.as_deref().and_then(|d| d.parse().ok())
    }

    /// Average frame rate in frames per second, from the "num/den" form.
    pub fn avg_fps(&self) -> Option<f64> {
        parse_rational(self.avg_frame_rate.as_deref()?)
    }

    /// Total frame count, when the container records it.
    pub fn frame_count(&self) -> Option<u64> {
        self.nb_frames.as_deref().and_then(|f| f.parse().ok())
    }
}

/// Boolean role markers attached to a stream.
///
/// ffprobe reports these as 0/1 integers; they are mapped to `bool` here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Disposition {
    #[serde(with = "int_bool")]
    pub default: bool,
    #[serde(with = "int_bool")]
    pub dub: bool,
    #[serde(with = "int_bool")]
    pub original: bool,
    #[serde(with = "int_bool")]
    pub comment: bool,
    #[serde(with = "int_bool")]
    pub lyrics: bool,
    #[serde(with = "int_bool")]
    pub karaoke: bool,
    #[serde(with = "int_bool")]
    pub forced: bool,
    #[serde(with = "int_bool")]
    pub hearing_impaired: bool,
    #[serde(with = "int_bool")]
    pub visual_impaired: bool,
    #[serde(with = "int_bool")]
    pub clean_effects: bool,
    #[serde(with = "int_bool")]
    pub attached_pic: bool,
    #[serde(with = "int_bool")]
    pub timed_thumbnails: bool,
}

/// serde adapter for ffprobe's 0/1 disposition flags.
mod int_bool {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(i64::deserialize(deserializer)? != 0)
    }

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(i64::from(*value))
    }
}

fn parse_rational(text: &str) -> Option<f64> {
    let (num, den) = text.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_long_name": "H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10",
                "profile": "Main",
                "codec_type": "video",
                "codec_tag_string": "avc1",
                "width": 1280,
                "height": 720,
                "pix_fmt": "yuv420p",
                "level": 31,
                "r_frame_rate": "25/1",
                "avg_frame_rate": "30000/1001",
                "time_base": "1/12800",
                "duration": "120.000000",
                "bit_rate": "1205959",
                "nb_frames": "3000",
                "disposition": {
                    "default": 1,
                    "dub": 0,
                    "forced": 0,
                    "attached_pic": 0
                },
                "tags": {
                    "language": "und",
                    "handler_name": "VideoHandler"
                }
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_fmt": "fltp",
                "sample_rate": "48000",
                "channels": 2,
                "channel_layout": "stereo",
                "duration": "120.000000"
            }
        ],
        "format": {
            "filename": "sample.mp4",
            "nb_streams": 2,
            "nb_programs": 0,
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "format_long_name": "QuickTime / MOV",
            "start_time": "0.000000",
            "duration": "120.000000",
            "size": "18094665",
            "bit_rate": "1206311",
            "probe_score": 100,
            "tags": {
                "major_brand": "isom",
                "encoder": "Lavf57.71.100"
            }
        }
    }"#;

    #[test]
    fn parses_full_document() {
        let info: MediaInfo = serde_json::from_str(SAMPLE).unwrap();
        assert!(!info.is_empty());

        let format = info.format.as_ref().unwrap();
        assert_eq!(format.format_name.as_deref(), Some("mov,mp4,m4a,3gp,3g2,mj2"));
        assert_eq!(format.nb_streams, Some(2));
        assert_eq!(format.duration_secs(), Some(120.0));
        assert_eq!(format.size_bytes(), Some(18_094_665));
        assert_eq!(format.bit_rate_bps(), Some(1_206_311));
        assert_eq!(format.probe_score, Some(100));
        assert_eq!(
            format.tags.as_ref().unwrap().get("major_brand").map(String::as_str),
            Some("isom")
        );

        let streams = info.streams.as_ref().unwrap();
        assert_eq!(streams.len(), 2);
    }

    #[test]
    fn video_stream_fields() {
        let info: MediaInfo = serde_json::from_str(SAMPLE).unwrap();
        let video = info.video_streams().next().unwrap();
        assert_eq!(video.codec_name.as_deref(), Some("h264"));
        assert_eq!(video.width, Some(1280));
        assert_eq!(video.height, Some(720));
        assert_eq!(video.duration_secs(), Some(120.0));
        assert_eq!(video.frame_count(), Some(3000));
        let fps = video.avg_fps().unwrap();
        assert!((fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn audio_stream_fields() {
        let info: MediaInfo = serde_json::from_str(SAMPLE).unwrap();
        let audio = info.audio_streams().next().unwrap();
        assert_eq!(audio.codec_name.as_deref(), Some("aac"));
        assert_eq!(audio.channels, Some(2));
        assert_eq!(audio.sample_rate.as_deref(), Some("48000"));
        assert_eq!(audio.channel_layout.as_deref(), Some("stereo"));
    }

    #[test]
    fn disposition_flags_map_to_bools() {
        let info: MediaInfo = serde_json::from_str(SAMPLE).unwrap();
        let video = info.video_streams().next().unwrap();
        let disposition = video.disposition.as_ref().unwrap();
        assert!(disposition.default);
        assert!(!disposition.dub);
        assert!(!disposition.forced);
        // Flags absent from the JSON default to false.
        assert!(!disposition.karaoke);
    }

    #[test]
    fn empty_object_is_empty() {
        let info: MediaInfo = serde_json::from_str("{}").unwrap();
        assert!(info.is_empty());
    }

    #[test]
    fn format_only_is_not_empty() {
        let info: MediaInfo = serde_json::from_str(r#"{"format":{"format_name":"wav"}}"#).unwrap();
        assert!(!info.is_empty());
        assert!(info.streams.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let info: MediaInfo =
            serde_json::from_str(r#"{"format":{"format_name":"mp4","new_field":42}}"#).unwrap();
        assert_eq!(
            info.format.unwrap().format_name.as_deref(),
            Some("mp4")
        );
    }

    #[test]
    fn malformed_numeric_strings_yield_none() {
        let format = FormatInfo {
            duration: Some("n/a".to_string()),
            size: Some("".to_string()),
            ..Default::default()
        };
        assert_eq!(format.duration_secs(), None);
        assert_eq!(format.size_bytes(), None);
    }

    #[test]
    fn rational_parsing() {
        assert_eq!(parse_rational("25/1"), Some(25.0));
        assert_eq!(parse_rational("0/0"), None);
        assert_eq!(parse_rational("unparseable"), None);
    }
}
