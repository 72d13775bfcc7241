use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use crate::assets::decode::{PreparedImage, decode_image_file, premul_bytes_to_pixmap};
use crate::assets::media::{self, VideoSourceInfo};
use crate::foundation::core::{Fps, Micros};
use crate::foundation::error::{ReelError, ReelResult};

const DEFAULT_CACHE_CAPACITY: usize = 64;
const DEFAULT_PREFETCH_FRAMES: u32 = 12;

/// Something that yields a raster for any scene-local instant.
///
/// Still images return the same raster forever; video clips return the frame showing at that
/// instant of the source.
pub trait VisualSource: Send {
    /// Native pixel size of the rasters this source yields.
    fn size(&self) -> (u32, u32);

    /// Raster visible at `local` (scene-local time).
    fn frame_at(&mut self, local: Micros) -> ReelResult<vello_cpu::Image>;
}

fn pixmap_to_image(pixmap: vello_cpu::Pixmap) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

/// A decoded still image.
pub struct StillImage {
    width: u32,
    height: u32,
    image: vello_cpu::Image,
}

impl StillImage {
    /// Decode an image file.
    pub fn open(path: &Path) -> ReelResult<Self> {
        Self::from_prepared(&decode_image_file(path)?)
    }

    /// Wrap an already decoded image.
    pub fn from_prepared(prepared: &PreparedImage) -> ReelResult<Self> {
        Ok(Self {
            width: prepared.width,
            height: prepared.height,
            image: pixmap_to_image(prepared.to_pixmap()?),
        })
    }
}

impl VisualSource for StillImage {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_at(&mut self, _local: Micros) -> ReelResult<vello_cpu::Image> {
        Ok(self.image.clone())
    }
}

type BatchDecoder = fn(&VideoSourceInfo, Micros, u32) -> ReelResult<Vec<Vec<u8>>>;

/// A video file decoded lazily in prefetched batches, with an LRU frame cache.
///
/// Requests past the last decodable frame hold that last frame.
pub struct VideoClip {
    info: VideoSourceInfo,
    fps: Fps,
    frame_cache: HashMap<u64, vello_cpu::Image>,
    lru: VecDeque<u64>,
    capacity: usize,
    prefetch_frames: u32,
    known_len: Option<u64>,
    decode: BatchDecoder,
}

impl VideoClip {
    /// Probe a video file and prepare a lazily decoding clip.
    pub fn open(path: &Path) -> ReelResult<Self> {
        Ok(Self::new(media::probe_video(path)?))
    }

    /// Build a clip from probed metadata.
    ///
    /// `STORYREEL_VIDEO_CACHE_CAPACITY` and `STORYREEL_VIDEO_PREFETCH_FRAMES` tune the cache.
    pub fn new(info: VideoSourceInfo) -> Self {
        let capacity = env_positive("STORYREEL_VIDEO_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY);
        let prefetch_frames =
            env_positive("STORYREEL_VIDEO_PREFETCH_FRAMES", DEFAULT_PREFETCH_FRAMES);
        Self::with_decoder(
            info,
            capacity,
            prefetch_frames,
            media::decode_video_frames_rgba8,
        )
    }

    fn with_decoder(
        info: VideoSourceInfo,
        capacity: usize,
        prefetch_frames: u32,
        decode: BatchDecoder,
    ) -> Self {
        let fps = Fps::new(info.fps_num, info.fps_den).unwrap_or_default();
        Self {
            info,
            fps,
            frame_cache: HashMap::new(),
            lru: VecDeque::new(),
            capacity: capacity.max(1),
            prefetch_frames: prefetch_frames.max(1),
            known_len: None,
            decode,
        }
    }

    /// Probed source metadata.
    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    fn index_for(&self, local: Micros) -> u64 {
        let num = u128::from(local.0) * u128::from(self.fps.num);
        let den = u128::from(self.fps.den) * u128::from(Micros::PER_SEC);
        (num / den) as u64
    }

    fn clamp_index(&self, idx: u64) -> ReelResult<u64> {
        match self.known_len {
            Some(0) => Err(self.no_frames()),
            Some(n) if idx >= n => Ok(n - 1),
            _ => Ok(idx),
        }
    }

    fn no_frames(&self) -> ReelError {
        ReelError::evaluation(format!(
            "video '{}' yielded no frames",
            self.info.source_path.display()
        ))
    }

    fn cached(&mut self, idx: u64) -> Option<vello_cpu::Image> {
        let img = self.frame_cache.get(&idx).cloned()?;
        self.touch(idx);
        Some(img)
    }

    fn prefetch(&mut self, idx: u64) -> ReelResult<()> {
        let window = u64::from(self.prefetch_frames);
        let start_idx = idx - idx % window;
        let frames = (self.decode)(
            &self.info,
            self.fps.frame_time(start_idx),
            self.prefetch_frames,
        )?;

        if (frames.len() as u64) < window {
            let end = start_idx + frames.len() as u64;
            self.known_len = Some(self.known_len.map_or(end, |n| n.min(end)));
        }
        for (offset, rgba) in frames.iter().enumerate() {
            let key = start_idx + offset as u64;
            if self.frame_cache.contains_key(&key) {
                self.touch(key);
                continue;
            }
            let pixmap = premul_bytes_to_pixmap(rgba, self.info.width, self.info.height)?;
            self.insert_frame(key, pixmap_to_image(pixmap));
        }
        Ok(())
    }

    fn insert_frame(&mut self, key: u64, image: vello_cpu::Image) {
        self.frame_cache.insert(key, image);
        self.touch(key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.frame_cache.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: u64) {
        if let Some(pos) = self.lru.iter().position(|x| *x == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}

impl VisualSource for VideoClip {
    fn size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn frame_at(&mut self, local: Micros) -> ReelResult<vello_cpu::Image> {
        let mut idx = self.clamp_index(self.index_for(local))?;
        loop {
            if let Some(img) = self.cached(idx) {
                return Ok(img);
            }
            self.prefetch(idx)?;
            if let Some(img) = self.cached(idx) {
                return Ok(img);
            }
            // A short batch lowered `known_len`; retry at the new last frame.
            let last = self.clamp_index(idx)?;
            if last == idx {
                return Err(self.no_frames());
            }
            idx = last;
        }
    }
}

fn env_positive<T: std::str::FromStr + PartialOrd + Default>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .filter(|n| *n > T::default())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
