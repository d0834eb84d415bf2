use std::{collections::BTreeMap, num::NonZeroU32, time::Duration};

use image::RgbImage;
use log::{debug, trace};
use vid_match_common::{fit_within, minimize_image, resize_img_rgb, CompositeGrid};

use crate::{
    definitions::{
        ARCHIVE_THUMB_MAX_DIMS, CELL_MAX_DIMS, FIRST_PASS_FRACTION, GO_BACKWARDS_PERCENT,
        VIDEO_STILL_USABLE,
    },
    Error, FrameDecoder, ThumbnailLayout, VideoRecord,
};

/// A composite thumbnail, plus any frames that had to be decoded to build it (keyed by
/// duration percentage and already shrunk to archival size) so the caller can persist them.
#[derive(Debug, Clone)]
pub struct Composite {
    pub image: RgbImage,
    pub new_captures: Vec<(u32, RgbImage)>,
}

/// The time at which the sample for `percent` is taken during a pass that covers
/// `fraction` percent of the video.
#[must_use]
pub fn sample_timestamp(duration_ms: u64, percent: u32, fraction: u32) -> Duration {
    Duration::from_millis(duration_ms * u64::from(percent) * u64::from(fraction) / 10_000)
}

/// Builds one composite image per video from frames sampled at the layout's percentages.
pub struct FrameCompositor<D> {
    decoder: D,
    layout: ThumbnailLayout,
}

impl<D: FrameDecoder> FrameCompositor<D> {
    pub const fn new(decoder: D, layout: ThumbnailLayout) -> Self {
        Self { decoder, layout }
    }

    /// Sample every percentage of the layout and tile the frames into a grid, cell `i` at
    /// column `i % cols`, row `i / cols`.
    ///
    /// Frames are requested starting with the last percentage so that a truncated tail is
    /// found before time is spent on the rest. If any frame cannot be decoded the whole pass
    /// is retried with every timestamp moved earlier, until too little of the video is
    /// left to be usable.
    ///
    /// `cached` holds previously captured frames by percentage. They are used in place of
    /// decoding but are still size-checked.
    ///
    /// # Errors
    /// * [`Error::UnreadableSource`] if no pass could decode every frame
    /// * [`Error::MalformedMetadata`] if any frame is larger than the video's resolution
    pub fn composite(
        &self,
        video: &VideoRecord,
        cached: &BTreeMap<u32, RgbImage>,
    ) -> Result<Composite, Error> {
        let video_dims = video.resolution();
        let (cols, rows) = self.layout.grid();
        let cell_dims = fit_within(video_dims, CELL_MAX_DIMS);
        let percentages = self.layout.percentages();

        let mut fraction = FIRST_PASS_FRACTION;
        'pass: loop {
            let mut grid = CompositeGrid::new(cols, rows, cell_dims);
            let mut new_captures = vec![];

            for (idx, &percent) in percentages.iter().enumerate().rev() {
                let frame = match cached.get(&percent) {
                    Some(frame) => frame.clone(),
                    None => {
                        let timestamp = sample_timestamp(video.duration_ms(), percent, fraction);
                        match self.decoder.capture_frame(video.path(), timestamp) {
                            Ok(frame) => {
                                new_captures.push((
                                    percent,
                                    minimize_image(&frame, ARCHIVE_THUMB_MAX_DIMS),
                                ));
                                frame
                            }
                            Err(e) => {
                                debug!(
                                    target: "frame_capture",
                                    "{}: no frame at {timestamp:?} ({e})",
                                    video.path().display()
                                );

                                fraction = fraction.saturating_sub(GO_BACKWARDS_PERCENT);
                                if fraction >= VIDEO_STILL_USABLE {
                                    continue 'pass;
                                }
                                return Err(Error::UnreadableSource);
                            }
                        }
                    }
                };

                check_frame_size(frame.dimensions(), video_dims)?;
                grid.place(idx as u32, &fit_to_cell(&frame, cell_dims));
            }

            trace!(
                target: "frame_capture",
                "{}: composited {} frames, {} newly decoded",
                video.path().display(),
                percentages.len(),
                new_captures.len()
            );

            return Ok(Composite {
                image: grid.into_image(),
                new_captures,
            });
        }
    }
}

fn check_frame_size(frame_dims: (u32, u32), video_dims: (u32, u32)) -> Result<(), Error> {
    if frame_dims.0 > video_dims.0 || frame_dims.1 > video_dims.1 {
        return Err(Error::MalformedMetadata {
            frame_dims,
            video_dims,
        });
    }
    Ok(())
}

//cells are filled edge to edge, ignoring the aspect ratio of the frame.
fn fit_to_cell(frame: &RgbImage, (cell_w, cell_h): (u32, u32)) -> RgbImage {
    match (NonZeroU32::new(cell_w), NonZeroU32::new(cell_h)) {
        (Some(w), Some(h)) => resize_img_rgb(frame, w, h),
        _ => frame.clone(),
    }
}

#[cfg(test)]
mod test {
    use std::{
        path::Path,
        sync::atomic::{AtomicU32, Ordering},
        time::UNIX_EPOCH,
    };

    use image::Rgb;
    use parking_lot::Mutex;

    use super::*;
    use crate::VideoMetadata;

    /// Serves solid frames whose shade depends on the timestamp. Fails every capture at
    /// or after `broken_after`.
    struct MockDecoder {
        frame_dims: (u32, u32),
        broken_after: Duration,
        requests: Mutex<Vec<Duration>>,
        captures: AtomicU32,
    }

    impl MockDecoder {
        fn new(frame_dims: (u32, u32), broken_after: Duration) -> Self {
            Self {
                frame_dims,
                broken_after,
                requests: Mutex::new(vec![]),
                captures: AtomicU32::new(0),
            }
        }
    }

    impl FrameDecoder for MockDecoder {
        fn video_metadata(&self, _path: &Path) -> Result<VideoMetadata, Error> {
            unreachable!("compositor never reads metadata")
        }

        fn capture_frame(&self, _path: &Path, timestamp: Duration) -> Result<RgbImage, Error> {
            self.requests.lock().push(timestamp);
            if timestamp >= self.broken_after {
                return Err(Error::Decoder("truncated".to_string()));
            }
            self.captures.fetch_add(1, Ordering::Relaxed);
            let shade = (timestamp.as_secs() % 256) as u8;
            let (w, h) = self.frame_dims;
            Ok(RgbImage::from_pixel(w, h, Rgb([shade, shade, shade])))
        }
    }

    fn video(duration_ms: u64, dims: (u32, u32)) -> VideoRecord {
        let metadata = VideoMetadata {
            duration_ms,
            width: dims.0,
            height: dims.1,
            ..VideoMetadata::default()
        };
        VideoRecord::new("/videos/v.mp4", 1, UNIX_EPOCH, &metadata)
    }

    #[test]
    fn test_timestamps_scale_with_fraction() {
        assert_eq!(sample_timestamp(100_000, 50, 100), Duration::from_secs(50));
        assert_eq!(sample_timestamp(100_000, 50, 93), Duration::from_millis(46_500));
    }

    #[test]
    fn test_frames_are_requested_last_first() {
        let decoder = MockDecoder::new((640, 480), Duration::MAX);
        let compositor = FrameCompositor::new(&decoder, ThumbnailLayout::Thumb4);

        let composite = compositor
            .composite(&video(100_000, (640, 480)), &BTreeMap::new())
            .unwrap();

        let requests = decoder.requests.lock().clone();
        let expected = [88, 64, 40, 16].map(Duration::from_secs);
        assert_eq!(requests, expected);

        //2x2 grid of 320x240 cells.
        assert_eq!(composite.image.dimensions(), (640, 480));
        assert_eq!(composite.new_captures.len(), 4);
        //cell 3 (bottom right) is the 88% frame.
        assert_eq!(composite.image.get_pixel(639, 479).0, [88, 88, 88]);
    }

    #[test]
    fn test_broken_tail_retries_earlier() {
        //the last 8% of the 100s video cannot be decoded, so 88% of 100% fails, but
        //88% of 93% (81.84s) succeeds.
        let decoder = MockDecoder::new((320, 240), Duration::from_secs(85));
        let compositor = FrameCompositor::new(&decoder, ThumbnailLayout::Thumb4);

        let composite = compositor
            .composite(&video(100_000, (320, 240)), &BTreeMap::new())
            .unwrap();

        let requests = decoder.requests.lock().clone();
        assert_eq!(requests[0], Duration::from_secs(88));
        assert_eq!(requests[1], Duration::from_millis(81_840));
        assert_eq!(requests.len(), 5);
        assert_eq!(composite.new_captures.len(), 4);
    }

    #[test]
    fn test_gives_up_when_too_little_is_usable() {
        //fractions tried: 100, 93, 86. 88% of 86% is 75.68s, still broken.
        let decoder = MockDecoder::new((320, 240), Duration::from_secs(70));
        let compositor = FrameCompositor::new(&decoder, ThumbnailLayout::Thumb4);

        let res = compositor.composite(&video(100_000, (320, 240)), &BTreeMap::new());

        assert_eq!(res.unwrap_err(), Error::UnreadableSource);
        assert_eq!(decoder.requests.lock().len(), 3);
    }

    #[test]
    fn test_oversized_frame_is_malformed_metadata() {
        let decoder = MockDecoder::new((1920, 1080), Duration::MAX);
        let compositor = FrameCompositor::new(&decoder, ThumbnailLayout::Thumb1);

        let res = compositor.composite(&video(10_000, (1280, 720)), &BTreeMap::new());

        assert!(matches!(res, Err(Error::MalformedMetadata { .. })));
    }

    #[test]
    fn test_cached_captures_skip_decoding() {
        let decoder = MockDecoder::new((320, 240), Duration::MAX);
        let compositor = FrameCompositor::new(&decoder, ThumbnailLayout::Thumb2);

        let mut cached = BTreeMap::new();
        cached.insert(64, RgbImage::from_pixel(160, 120, Rgb([200, 10, 10])));

        let composite = compositor
            .composite(&video(100_000, (320, 240)), &cached)
            .unwrap();

        assert_eq!(decoder.captures.load(Ordering::Relaxed), 1);
        assert_eq!(composite.new_captures.len(), 1);
        assert_eq!(composite.new_captures[0].0, 32);
        //the cached frame is stretched over the whole right-hand cell.
        assert_eq!(composite.image.get_pixel(639, 239).0, [200, 10, 10]);
    }

    #[test]
    fn test_oversized_cached_capture_is_rejected() {
        let decoder = MockDecoder::new((320, 240), Duration::MAX);
        let compositor = FrameCompositor::new(&decoder, ThumbnailLayout::Thumb1);

        let mut cached = BTreeMap::new();
        cached.insert(48, RgbImage::new(400, 300));

        let res = compositor.composite(&video(100_000, (320, 240)), &cached);
        assert!(matches!(res, Err(Error::MalformedMetadata { .. })));
        assert_eq!(decoder.captures.load(Ordering::Relaxed), 0);
    }
}
