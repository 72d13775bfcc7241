use std::path::Path;
use std::sync::Arc;

use crate::assets::media::{self, AudioPcm, MIX_SAMPLE_RATE};
use crate::assets::source::{StillImage, VideoClip, VisualSource};
use crate::captions::overlay::{CaptionOverlayBuilder, CaptionStyle, OverlayLayer};
use crate::foundation::core::{Affine, CanvasSpec, Micros, Point, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::{
    AssetKind, CaptionSegment, Scene, SceneAsset, derive_local_duration, validate_captions,
};

/// Slow-zoom growth per second of scene-local time.
pub const ZOOM_RATE: f64 = 0.02;

/// Cover-fit of a source raster onto the canvas: uniform scale, centered crop, never letterboxed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    /// Smallest uniform scale that covers the canvas.
    pub scale: f64,
    /// Source size in pixels.
    pub source: (u32, u32),
    /// Canvas size in pixels.
    pub canvas: (u32, u32),
}

impl CoverFit {
    /// Compute the cover-fit scale for a `width x height` source.
    pub fn new(width: u32, height: u32, canvas: &CanvasSpec) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::evaluation(format!(
                "source has degenerate size {width}x{height}"
            )));
        }
        let sx = f64::from(canvas.width) / f64::from(width);
        let sy = f64::from(canvas.height) / f64::from(height);
        Ok(Self {
            scale: sx.max(sy),
            source: (width, height),
            canvas: (canvas.width, canvas.height),
        })
    }

    /// Source size after scaling, before the crop.
    pub fn scaled_size(&self) -> (f64, f64) {
        (
            f64::from(self.source.0) * self.scale,
            f64::from(self.source.1) * self.scale,
        )
    }

    /// Top-left of the canvas-sized crop window inside the scaled frame.
    pub fn crop_origin(&self) -> Point {
        let (w, h) = self.scaled_size();
        Point::new(
            (w - f64::from(self.canvas.0)) / 2.0,
            (h - f64::from(self.canvas.1)) / 2.0,
        )
    }

    /// Cover scale with the slow zoom applied at local `t`.
    pub fn scale_at(&self, t: Micros) -> f64 {
        self.scale * (1.0 + ZOOM_RATE * t.as_secs_f64())
    }

    /// Source-to-canvas transform at local `t`; the source center stays on the canvas center.
    pub fn transform_at(&self, t: Micros) -> Affine {
        let canvas_center = Vec2::new(
            f64::from(self.canvas.0) / 2.0,
            f64::from(self.canvas.1) / 2.0,
        );
        let source_center = Vec2::new(
            f64::from(self.source.0) / 2.0,
            f64::from(self.source.1) / 2.0,
        );
        Affine::translate(canvas_center)
            * Affine::scale(self.scale_at(t))
            * Affine::translate(-source_center)
    }
}

/// Cover-fit, zooming visual track pinned to the scene length.
pub struct VisualTrack {
    source: Box<dyn VisualSource>,
    fit: CoverFit,
    duration: Micros,
}

impl VisualTrack {
    /// Wrap a source for `canvas`, lasting `duration`.
    pub fn new(
        source: Box<dyn VisualSource>,
        canvas: &CanvasSpec,
        duration: Micros,
    ) -> ReelResult<Self> {
        let (w, h) = source.size();
        Ok(Self {
            fit: CoverFit::new(w, h, canvas)?,
            source,
            duration,
        })
    }

    /// Cover-fit parameters.
    pub fn fit(&self) -> &CoverFit {
        &self.fit
    }

    /// Track length.
    pub fn duration(&self) -> Micros {
        self.duration
    }

    /// Source-to-canvas transform at local `t`.
    pub fn transform_at(&self, t: Micros) -> Affine {
        self.fit.transform_at(t)
    }

    /// Source raster at local `t`; instants past the end are clamped to the last one.
    pub fn frame_at(&mut self, t: Micros) -> ReelResult<vello_cpu::Image> {
        let last = self.duration.saturating_sub(Micros(1));
        self.source.frame_at(t.min(last))
    }
}

/// Narration PCM (interleaved stereo `f32` at [`MIX_SAMPLE_RATE`]) fitted to the scene length.
#[derive(Clone, Debug)]
pub struct AudioTrack {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved samples.
    pub samples: Arc<Vec<f32>>,
}

impl AudioTrack {
    /// Pad with silence or truncate decoded PCM to exactly `duration`.
    pub fn fitted(pcm: AudioPcm, duration: Micros) -> Self {
        let channels = pcm.channels.max(1);
        let wanted = duration.to_sample(pcm.sample_rate) as usize * usize::from(channels);
        let mut samples = pcm.interleaved_f32;
        samples.resize(wanted, 0.0);
        Self {
            sample_rate: pcm.sample_rate,
            channels,
            samples: Arc::new(samples),
        }
    }

    /// Silent stereo track of `duration`.
    pub fn silence(duration: Micros) -> Self {
        Self::fitted(
            AudioPcm {
                sample_rate: MIX_SAMPLE_RATE,
                channels: 2,
                interleaved_f32: Vec::new(),
            },
            duration,
        )
    }

    /// Number of sample frames.
    pub fn frame_count(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }
}

/// A fully rendered scene: visual track, audio, and caption layers on one local timeline.
pub struct RenderedSceneClip {
    /// Index of the scene this clip came from.
    pub source_index: usize,
    /// Cover-fit zooming visual.
    pub visual: VisualTrack,
    /// Narration fitted to the clip length.
    pub audio: AudioTrack,
    /// Caption layers in draw order (background then text, per segment).
    pub overlays: Vec<OverlayLayer>,
    /// Clip length.
    pub local_duration: Micros,
}

impl RenderedSceneClip {
    /// Assemble a clip from already prepared parts.
    pub fn new(
        source_index: usize,
        source: Box<dyn VisualSource>,
        canvas: &CanvasSpec,
        audio: AudioTrack,
        overlays: Vec<OverlayLayer>,
        local_duration: Micros,
    ) -> ReelResult<Self> {
        if local_duration.is_zero() {
            return Err(ReelError::validation(format!(
                "scene {source_index} has zero duration"
            )));
        }
        Ok(Self {
            source_index,
            visual: VisualTrack::new(source, canvas, local_duration)?,
            audio,
            overlays,
            local_duration,
        })
    }

    /// Overlay layers visible at local `t`, in draw order.
    pub fn visible_overlays(&self, t: Micros) -> impl Iterator<Item = &OverlayLayer> {
        self.overlays.iter().filter(move |l| l.visible_at(t))
    }
}

impl std::fmt::Debug for RenderedSceneClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedSceneClip")
            .field("source_index", &self.source_index)
            .field("local_duration", &self.local_duration)
            .field("overlays", &self.overlays.len())
            .finish_non_exhaustive()
    }
}

fn open_visual(scene: usize, asset: &SceneAsset) -> ReelResult<Box<dyn VisualSource>> {
    let opened: ReelResult<Box<dyn VisualSource>> = match asset.kind {
        AssetKind::Image => StillImage::open(&asset.path).map(|s| Box::new(s) as Box<dyn VisualSource>),
        AssetKind::Video => VideoClip::open(&asset.path).map(|s| Box::new(s) as Box<dyn VisualSource>),
    };
    opened.map_err(|e| ReelError::asset_decode(scene, &asset.path, e))
}

fn build_overlays(
    scene: usize,
    captions: &[CaptionSegment],
    canvas: &CanvasSpec,
    style: &CaptionStyle,
) -> ReelResult<Vec<OverlayLayer>> {
    let Some(first) = captions.iter().position(|s| !s.text.trim().is_empty()) else {
        return Ok(Vec::new());
    };
    let mut builder = CaptionOverlayBuilder::new(*canvas, style.clone())
        .map_err(|e| ReelError::caption(scene, first, e.to_string()))?;

    let mut layers = Vec::with_capacity(captions.len() * 2);
    for (i, seg) in captions.iter().enumerate() {
        let built = builder
            .build(seg)
            .map_err(|e| ReelError::caption(scene, i, e.to_string()))?;
        if let Some((text, background)) = built {
            layers.push(background);
            layers.push(text);
        }
    }
    Ok(layers)
}

/// Render one scene into a self-contained clip.
///
/// Fails with [`ReelError::AssetDecode`] or [`ReelError::AudioDecode`] when media cannot be
/// opened, and with [`ReelError::CaptionOverlay`] when any caption segment fails.
#[tracing::instrument(level = "info", skip_all, fields(scene = scene.index))]
pub fn render_scene(
    scene: &Scene,
    canvas: &CanvasSpec,
    style: &CaptionStyle,
) -> ReelResult<RenderedSceneClip> {
    let duration = scene.local_duration;
    if duration.is_zero() {
        return Err(ReelError::validation(format!(
            "scene {} has zero duration",
            scene.index
        )));
    }

    let source = open_visual(scene.index, &scene.asset)?;

    let pcm = media::decode_audio_f32_stereo(&scene.audio_path, MIX_SAMPLE_RATE)
        .map_err(|e| ReelError::audio_decode(scene.index, &scene.audio_path, e))?;
    if pcm.interleaved_f32.is_empty() {
        return Err(ReelError::audio_decode(
            scene.index,
            &scene.audio_path,
            anyhow::anyhow!("narration contains no audio samples"),
        ));
    }
    let audio = AudioTrack::fitted(pcm, duration);

    let captions = validate_captions(scene.index, &scene.captions, duration)?;
    let overlays = build_overlays(scene.index, &captions, canvas, style)?;
    tracing::debug!(
        layers = overlays.len(),
        duration = %duration,
        "scene rendered"
    );

    RenderedSceneClip::new(scene.index, source, canvas, audio, overlays, duration)
}

/// Per-scene work used by the pipeline coordinator.
pub trait SceneRenderer: Sync {
    /// Scene length derived from its media, without rendering.
    fn probe_duration(
        &self,
        scene: usize,
        asset: &SceneAsset,
        audio_path: &Path,
    ) -> ReelResult<Micros>;

    /// Render one scene.
    fn render_scene(
        &self,
        scene: &Scene,
        canvas: &CanvasSpec,
        style: &CaptionStyle,
    ) -> ReelResult<RenderedSceneClip>;
}

/// Default renderer backed by ffprobe/ffmpeg, `image`, `parley` and `vello_cpu`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MediaSceneRenderer;

impl SceneRenderer for MediaSceneRenderer {
    fn probe_duration(
        &self,
        scene: usize,
        asset: &SceneAsset,
        audio_path: &Path,
    ) -> ReelResult<Micros> {
        let audio = media::probe_duration(audio_path)
            .map_err(|e| ReelError::audio_decode(scene, audio_path, e))?;
        let source = match asset.kind {
            AssetKind::Image => None,
            AssetKind::Video => Some(
                media::probe_video(&asset.path)
                    .map_err(|e| ReelError::asset_decode(scene, &asset.path, e))?
                    .duration,
            ),
        };
        Ok(derive_local_duration(asset.kind, audio, source))
    }

    fn render_scene(
        &self,
        scene: &Scene,
        canvas: &CanvasSpec,
        style: &CaptionStyle,
    ) -> ReelResult<RenderedSceneClip> {
        render_scene(scene, canvas, style)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/renderer.rs"]
mod tests;
