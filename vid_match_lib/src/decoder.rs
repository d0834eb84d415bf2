use std::{path::Path, time::Duration};

use image::RgbImage;

use crate::{Error, VideoMetadata};

/// Source of container metadata and decoded frames.
pub trait FrameDecoder: Send + Sync {
    /// Read container metadata.
    fn video_metadata(&self, path: &Path) -> Result<VideoMetadata, Error>;

    /// Decode the frame displayed at `timestamp`. Rotation must already be applied, so the
    /// frame is never larger than [`VideoMetadata::display_resolution`].
    fn capture_frame(&self, path: &Path, timestamp: Duration) -> Result<RgbImage, Error>;
}

impl<T: FrameDecoder + ?Sized> FrameDecoder for &T {
    fn video_metadata(&self, path: &Path) -> Result<VideoMetadata, Error> {
        (**self).video_metadata(path)
    }

    fn capture_frame(&self, path: &Path, timestamp: Duration) -> Result<RgbImage, Error> {
        (**self).capture_frame(path, timestamp)
    }
}

#[cfg(feature = "ffmpeg_backend")]
pub use ffmpeg::FfmpegDecoder;

#[cfg(feature = "ffmpeg_backend")]
mod ffmpeg {
    use std::{path::Path, time::Duration};

    use ffmpeg_frame_capture::{capture_frame_at, FfmpegVideoRotation, VideoInfo};
    use image::RgbImage;

    use crate::{Error, FrameDecoder, Rotation, VideoMetadata};

    /// Decodes with the `ffmpeg` and `ffprobe` command line tools.
    #[derive(Debug, Clone, Copy)]
    pub struct FfmpegDecoder {
        capture_timeout: Duration,
    }

    impl Default for FfmpegDecoder {
        fn default() -> Self {
            Self {
                capture_timeout: Duration::from_secs(30),
            }
        }
    }

    impl FfmpegDecoder {
        /// Give up on a single frame capture after `capture_timeout`.
        #[must_use]
        pub const fn with_timeout(capture_timeout: Duration) -> Self {
            Self { capture_timeout }
        }
    }

    impl FrameDecoder for FfmpegDecoder {
        fn video_metadata(&self, path: &Path) -> Result<VideoMetadata, Error> {
            let info = VideoInfo::new(path).map_err(|e| Error::Decoder(e.to_string()))?;
            let (width, height) = info.coded_resolution();

            Ok(VideoMetadata {
                duration_ms: u64::try_from(info.duration().as_millis()).unwrap_or(u64::MAX),
                width,
                height,
                rotation: match info.rotation() {
                    FfmpegVideoRotation::Rot0 => Rotation::Rot0,
                    FfmpegVideoRotation::Rot90 => Rotation::Rot90,
                    FfmpegVideoRotation::Rot180 => Rotation::Rot180,
                    FfmpegVideoRotation::Rot270 => Rotation::Rot270,
                },
                framerate: info.framerate(),
                bitrate_kbps: info.bitrate_kbps(),
                codec: info.video_codec().to_string(),
                audio: info.audio().to_string(),
            })
        }

        fn capture_frame(&self, path: &Path, timestamp: Duration) -> Result<RgbImage, Error> {
            capture_frame_at(path, timestamp, self.capture_timeout)
                .map_err(|e| Error::Decoder(e.to_string()))
        }
    }
}
