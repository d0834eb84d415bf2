use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::*;

#[derive(Debug, Deserialize, Serialize, Clone, Error)]
pub enum VideoInfoError {
    #[error("Error parsing stats: {0}")]
    JsonError(String),
    #[error("Error parsing stats: {0}")]
    ParseIntError(String),
    #[error("Error parsing stats: {0}")]
    ParseFloatError(String),
    #[error("Unexpected video rotation: {0}")]
    UnexpectedRotation(String),
}

impl From<serde_json::Error> for VideoInfoError {
    fn from(e: serde_json::Error) -> Self {
        //limit maximum number of characters
        let error_string = format!("{e}").chars().take(500).collect::<String>();
        VideoInfoError::JsonError(error_string)
    }
}

impl From<std::num::ParseIntError> for VideoInfoError {
    fn from(e: std::num::ParseIntError) -> Self {
        VideoInfoError::ParseIntError(format!("{e}"))
    }
}

impl From<std::num::ParseFloatError> for VideoInfoError {
    fn from(e: std::num::ParseFloatError) -> Self {
        VideoInfoError::ParseFloatError(format!("{e}"))
    }
}

// If the video metadata declares a rotation, the raw (x, y) resolution in that metadata
// refers to the "unrotated" resolution. Callers must swap x and y if the rotation is 90 or 270.
// (ffmpeg autorotates the frames it decodes, so captured frames are already upright.)
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug, Copy, Serialize, Deserialize, Hash, Default)]
pub enum FfmpegVideoRotation {
    #[default]
    Rot0,
    Rot90,
    Rot180,
    Rot270,
}

impl FfmpegVideoRotation {
    #[must_use]
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Rot90 | Self::Rot270)
    }
}

/// The video metadata that can be obtained by using ffprobe.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize, Default)]
pub struct VideoInfo {
    duration: std::time::Duration,
    bitrate_kbps: u32,
    coded_resolution: (u32, u32),
    rotation: FfmpegVideoRotation,
    framerate: f64,
    video_codec: String,
    audio: String,
}

impl VideoInfo {
    /// Use ffprobe to get the metadata of a video. If the video contains multiple streams then only information
    /// about the first video and first audio stream will be returned.
    ///
    /// # errors
    /// * The file cannot be read or is not recognized as a video by ffprobe
    /// * The output from ffprobe could not be parsed as JSON
    pub fn new<P>(src_path: P) -> Result<Self, FfmpegError>
    where
        P: AsRef<Path>,
    {
        let stats_string = get_video_stats(&src_path)?;
        Ok(Self::from_ffprobe_json(&stats_string)?)
    }

    /// Parse the output of `ffprobe -show_format -show_streams -print_format json`.
    /// Missing fields are reported as zero/empty rather than as errors.
    pub fn from_ffprobe_json(stats_string: &str) -> Result<Self, VideoInfoError> {
        let stats_parsed: Value = serde_json::from_str(stats_string)?;

        let duration = if let Value::String(d) = &stats_parsed["format"]["duration"] {
            std::time::Duration::from_secs_f64(d.parse::<f64>()?.max(0.0))
        } else {
            std::time::Duration::from_secs_f64(0.0)
        };

        let bitrate_kbps = if let Value::String(b) = &stats_parsed["format"]["bit_rate"] {
            (b.parse::<u64>()? / 1000) as u32
        } else {
            0
        };

        let video = Self::first_stream(&stats_parsed, "video");

        let rotation = video
            .map(Self::parse_rotation)
            .transpose()?
            .unwrap_or_default();

        let coded_resolution = {
            let width = video.and_then(|v| Self::u32_field(v, "width")).unwrap_or(0);
            let height = video.and_then(|v| Self::u32_field(v, "height")).unwrap_or(0);
            (width, height)
        };

        let framerate = video
            .and_then(|v| {
                Self::parse_ratio(&v["avg_frame_rate"]).or_else(|| Self::parse_ratio(&v["r_frame_rate"]))
            })
            //round to one decimal place
            .map(|fps| (fps * 10.0).round() / 10.0)
            .unwrap_or(0.0);

        let video_codec = video
            .and_then(|v| v["codec_name"].as_str())
            .unwrap_or_default()
            .to_string();

        let audio = Self::first_stream(&stats_parsed, "audio")
            .map(Self::describe_audio)
            .unwrap_or_default();

        Ok(VideoInfo {
            duration,
            bitrate_kbps,
            coded_resolution,
            rotation,
            framerate,
            video_codec,
            audio,
        })
    }

    /// The duration of the video
    pub fn duration(&self) -> std::time::Duration {
        self.duration
    }

    /// Container bit rate in kb/s
    pub fn bitrate_kbps(&self) -> u32 {
        self.bitrate_kbps
    }

    /// The resolution as stored in the stream, before any rotation is applied.
    pub fn coded_resolution(&self) -> (u32, u32) {
        self.coded_resolution
    }

    pub fn rotation(&self) -> FfmpegVideoRotation {
        self.rotation
    }

    /// Frames per second, rounded to one decimal place.
    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    pub fn video_codec(&self) -> &str {
        &self.video_codec
    }

    /// A short human readable description of the first audio stream, e.g.
    /// `"aac 48000 Hz stereo 128 kb/s"`. Empty if there is no audio.
    pub fn audio(&self) -> &str {
        &self.audio
    }

    fn first_stream<'a>(stats_parsed: &'a Value, stream_type: &str) -> Option<&'a Value> {
        if let Value::Array(streams) = &stats_parsed["streams"] {
            streams.iter().find(|s| match &s["codec_type"] {
                Value::String(codec_type) => codec_type == stream_type,
                _ => false,
            })
        } else {
            None
        }
    }

    fn u32_field(stream: &Value, field_name: &str) -> Option<u32> {
        match &stream[field_name] {
            Value::Number(v) => v.as_u64().map(|v| v as u32),
            Value::String(v) => v.parse().ok(),
            _ => None,
        }
    }

    // "30000/1001" style rationals
    fn parse_ratio(val: &Value) -> Option<f64> {
        let (num, den) = val.as_str()?.split_once('/')?;
        let num = num.parse::<f64>().ok()?;
        let den = den.parse::<f64>().ok()?;
        (den != 0.0).then(|| num / den)
    }

    fn parse_rotation(video_stream: &Value) -> Result<FfmpegVideoRotation, VideoInfoError> {
        // newer ffprobe reports rotation in the display matrix side data, older ones
        // in the "rotate" tag.
        let from_side_data = video_stream["side_data_list"]
            .as_array()
            .and_then(|list| list.iter().find_map(|sd| sd.get("rotation")));
        let from_tags = video_stream["tags"].get("rotate");

        //if the rotation is found, it may either be a JSON String or JSON number, so unify
        //them here.
        let rotation = match from_side_data.or(from_tags) {
            None => return Ok(FfmpegVideoRotation::Rot0),
            Some(Value::Number(val)) => val
                .as_i64()
                .ok_or_else(|| VideoInfoError::UnexpectedRotation(val.to_string()))?,
            Some(Value::String(val)) => val.trim().parse::<i64>()?,
            Some(other) => return Err(VideoInfoError::UnexpectedRotation(other.to_string())),
        };

        match rotation.rem_euclid(360) {
            0 => Ok(FfmpegVideoRotation::Rot0),
            90 => Ok(FfmpegVideoRotation::Rot90),
            180 => Ok(FfmpegVideoRotation::Rot180),
            270 => Ok(FfmpegVideoRotation::Rot270),
            _ => Err(VideoInfoError::UnexpectedRotation(rotation.to_string())),
        }
    }

    fn describe_audio(audio_stream: &Value) -> String {
        let codec = audio_stream["codec_name"].as_str().unwrap_or("unknown");
        let sample_rate = Self::u32_field(audio_stream, "sample_rate").unwrap_or(0);
        let channels = match Self::u32_field(audio_stream, "channels") {
            Some(1) => "mono".to_string(),
            Some(2) => "stereo".to_string(),
            Some(n) => format!("{n} channels"),
            None => "? channels".to_string(),
        };

        let mut ret = format!("{codec} {sample_rate} Hz {channels}");
        if let Some(kbps) = Self::u32_field(audio_stream, "bit_rate").map(|b| b / 1000) {
            if kbps > 0 {
                ret.push_str(&format!(" {kbps} kb/s"));
            }
        }
        ret
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PORTRAIT_PHONE_CLIP: &str = r#"{
        "streams": [
            {
                "codec_name": "h264",
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "avg_frame_rate": "30000/1001",
                "r_frame_rate": "30/1",
                "side_data_list": [ { "side_data_type": "Display Matrix", "rotation": -90 } ]
            },
            {
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "48000",
                "channels": 2,
                "bit_rate": "128000"
            }
        ],
        "format": { "duration": "61.500000", "size": "1000", "bit_rate": "4500000" }
    }"#;

    #[test]
    fn test_parses_full_ffprobe_output() {
        let info = VideoInfo::from_ffprobe_json(PORTRAIT_PHONE_CLIP).unwrap();

        assert_eq!(info.duration().as_millis(), 61_500);
        assert_eq!(info.bitrate_kbps(), 4500);
        assert_eq!(info.coded_resolution(), (1920, 1080));
        assert_eq!(info.rotation(), FfmpegVideoRotation::Rot270);
        assert!(info.rotation().swaps_axes());
        assert_eq!(info.framerate(), 30.0);
        assert_eq!(info.video_codec(), "h264");
        assert_eq!(info.audio(), "aac 48000 Hz stereo 128 kb/s");
    }

    #[test]
    fn test_rotate_tag_and_missing_audio() {
        let json = r#"{
            "streams": [ { "codec_type": "video", "codec_name": "hevc", "width": 640, "height": 360,
                           "avg_frame_rate": "0/0", "r_frame_rate": "25/1", "tags": { "rotate": "180" } } ],
            "format": { "duration": "10.0" }
        }"#;
        let info = VideoInfo::from_ffprobe_json(json).unwrap();

        assert_eq!(info.rotation(), FfmpegVideoRotation::Rot180);
        assert!(!info.rotation().swaps_axes());
        assert_eq!(info.framerate(), 25.0);
        assert_eq!(info.bitrate_kbps(), 0);
        assert_eq!(info.audio(), "");
    }

    #[test]
    fn test_audio_only_file_has_no_resolution() {
        let json = r#"{ "streams": [ { "codec_type": "audio", "codec_name": "mp3", "channels": 1, "sample_rate": "44100" } ],
                        "format": { "duration": "200.0" } }"#;
        let info = VideoInfo::from_ffprobe_json(json).unwrap();

        assert_eq!(info.coded_resolution(), (0, 0));
        assert_eq!(info.audio(), "mp3 44100 Hz mono");
    }

    #[test]
    fn test_odd_rotation_is_an_error() {
        let json = r#"{ "streams": [ { "codec_type": "video", "width": 10, "height": 10, "tags": { "rotate": "45" } } ] }"#;
        assert!(matches!(
            VideoInfo::from_ffprobe_json(json),
            Err(VideoInfoError::UnexpectedRotation(_))
        ));
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(
            VideoInfo::from_ffprobe_json("ffprobe: command not found"),
            Err(VideoInfoError::JsonError(_))
        ));
    }
}
