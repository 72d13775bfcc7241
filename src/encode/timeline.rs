use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::audio::mix::{AudioManifest, mix_manifest, write_mix_to_f32le_file};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir};
use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
use crate::foundation::core::{CanvasSpec, FrameIndex, Micros};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::compositor::TimelineCompositor;
use crate::timeline::assemble::Timeline;

/// The encoded result of a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalOutput {
    /// Written file.
    pub path: PathBuf,
    /// Canvas the file was encoded at.
    pub canvas: CanvasSpec,
    /// Timeline length.
    pub total_duration: Micros,
}

/// Turns an assembled timeline into one output media file.
pub trait TimelineSink {
    /// Flatten and serialize `timeline`.
    fn encode(&mut self, timeline: Timeline, canvas: &CanvasSpec) -> ReelResult<FinalOutput>;
}

/// Render every output frame of `timeline` in order and push it into `sink`.
///
/// Returns the number of frames pushed.
#[tracing::instrument(level = "info", skip_all, fields(total = %timeline.total_duration()))]
pub fn flatten_timeline(
    timeline: &mut Timeline,
    canvas: &CanvasSpec,
    sink: &mut dyn FrameSink,
    audio: Option<AudioInputConfig>,
) -> ReelResult<u64> {
    let mut compositor = TimelineCompositor::new(*canvas)?;
    let frames = canvas.fps.frames_for(timeline.total_duration());

    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps: canvas.fps,
        audio,
    })?;
    for i in 0..frames {
        let frame = compositor.render_at(timeline, canvas.fps.frame_time(i))?;
        sink.push_frame(FrameIndex(i), &frame)?;
    }
    sink.end()?;

    tracing::debug!(frames, "timeline flattened");
    Ok(frames)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn temp_mix_path() -> PathBuf {
    std::env::temp_dir().join(format!(
        "storyreel_audio_mix_{}_{}.f32le",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}

/// Default sink: H.264/AAC MP4 through the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegTimelineSink {
    opts: FfmpegSinkOpts,
}

impl FfmpegTimelineSink {
    /// Sink writing to `opts.out_path`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self { opts }
    }
}

impl TimelineSink for FfmpegTimelineSink {
    fn encode(&mut self, mut timeline: Timeline, canvas: &CanvasSpec) -> ReelResult<FinalOutput> {
        let manifest = AudioManifest::from_timeline(&timeline)?;
        let mut audio_tmp = TempFileGuard(None);
        let audio = if manifest.segments.is_empty() {
            None
        } else {
            let path = temp_mix_path();
            audio_tmp.0 = Some(path.clone());
            write_mix_to_f32le_file(&mix_manifest(&manifest), &path)?;
            Some(AudioInputConfig {
                path,
                sample_rate: manifest.sample_rate,
                channels: manifest.channels,
            })
        };

        let mut sink = FfmpegSink::new(self.opts.clone());
        flatten_timeline(&mut timeline, canvas, &mut sink, audio)?;
        drop(audio_tmp);

        Ok(FinalOutput {
            path: self.opts.out_path.clone(),
            canvas: *canvas,
            total_duration: timeline.total_duration(),
        })
    }
}

/// Keeps flattened frames and the audio mix in memory; for tests and previews.
#[derive(Debug, Default)]
pub struct InMemoryTimelineSink {
    /// Captured frames.
    pub frames: InMemorySink,
    /// Interleaved stereo mix at 48 kHz.
    pub audio: Vec<f32>,
}

impl InMemoryTimelineSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimelineSink for InMemoryTimelineSink {
    fn encode(&mut self, mut timeline: Timeline, canvas: &CanvasSpec) -> ReelResult<FinalOutput> {
        self.audio = mix_manifest(&AudioManifest::from_timeline(&timeline)?);
        flatten_timeline(&mut timeline, canvas, &mut self.frames, None)?;
        Ok(FinalOutput {
            path: PathBuf::new(),
            canvas: *canvas,
            total_duration: timeline.total_duration(),
        })
    }
}

/// Flatten the timeline at instant `t` over black and write it as a PNG.
pub fn render_frame_png(
    timeline: &mut Timeline,
    canvas: &CanvasSpec,
    t: Micros,
    out: &Path,
) -> ReelResult<()> {
    if t >= timeline.total_duration() {
        return Err(ReelError::validation(format!(
            "frame time {t} is past the end of the timeline ({})",
            timeline.total_duration()
        )));
    }
    let frame = TimelineCompositor::new(*canvas)?
        .render_at(timeline, t)?
        .flattened_over([0, 0, 0])?;

    ensure_parent_dir(out)?;
    image::save_buffer_with_format(
        out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/timeline.rs"]
mod tests;
