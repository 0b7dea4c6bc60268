use crate::{MacroRecorderError, Rect, Result, ScreenState};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source of full-resolution screen pixels
pub trait ScreenSource: Send {
    /// The area a recording samples, i.e. the whole screen
    fn screen_rect(&mut self) -> Result<Rect>;

    /// Grab the pixels inside `rect`
    fn capture(&mut self, rect: Rect) -> Result<RgbaImage>;
}

/// Halve both dimensions with nearest-neighbour sampling and drop colour
pub fn downsample(frame: &RgbaImage) -> GrayImage {
    let width = (frame.width() / 2).max(1);
    let height = (frame.height() / 2).max(1);
    let half = imageops::resize(frame, width, height, FilterType::Nearest);
    DynamicImage::ImageRgba8(half).to_luma8()
}

/// On-disk cache of downsampled frames, one PNG per capture named by its
/// timestamp. A second capture at the same millisecond overwrites the first.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    cache_dir: PathBuf,
}

impl SnapshotStore {
    /// Open the cache, creating the directory if needed
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn path_for(&self, time: u64) -> PathBuf {
        self.cache_dir.join(format!("{}.png", time))
    }

    /// Grab `rect`, downsample it and persist it under `time`
    pub fn capture(
        &self,
        screen: &mut dyn ScreenSource,
        rect: Rect,
        time: u64,
    ) -> Result<ScreenState> {
        let frame = screen.capture(rect)?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(MacroRecorderError::SnapshotError(
                "screen source returned an empty frame".to_string(),
            ));
        }
        self.store(time, &downsample(&frame))
    }

    /// Persist an already-downsampled raster
    pub fn store(&self, time: u64, image: &GrayImage) -> Result<ScreenState> {
        let path = self.path_for(time);
        image.save(&path)?;
        debug!(time, path = %path.display(), "Snapshot written");
        Ok(ScreenState {
            time,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Read a frame back. Any failure means "no image for this frame".
    pub fn load(&self, time: u64) -> Option<GrayImage> {
        let path = self.path_for(time);
        match image::open(&path) {
            Ok(image) => Some(image.to_luma8()),
            Err(e) => {
                debug!(time, error = %e, "Snapshot unavailable");
                None
            }
        }
    }

    pub fn image_for(&self, state: &ScreenState) -> Option<GrayImage> {
        self.load(state.time)
    }
}
