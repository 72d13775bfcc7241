//! Storyreel turns narrated scenes into a single video.
//!
//! Each scene pairs a still image or video clip with a narration track and a timed transcript.
//! The engine works in four stages:
//!
//! - Build caption overlays for every transcript segment ([`CaptionOverlayBuilder`])
//! - Render each scene into a [`RenderedSceneClip`] with cover-fit framing and a slow zoom
//! - Place clips on a [`Timeline`] joined by cut, fade or slide transitions
//! - Encode the timeline through a [`TimelineSink`], normally ffmpeg to MP4
//!
//! [`compose`] runs the whole flow for a [`ComposeJob`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assets;
mod audio;
mod captions;
mod encode;
mod foundation;
mod pipeline;
mod render;
mod scene;
mod timeline;

pub use crate::foundation::core::{
    Affine, CanvasSpec, Fps, FrameIndex, MAX_RASTER_EDGE, Micros, Point, Rect, Vec2,
};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::assets::color::CaptionColor;
pub use crate::assets::decode::{PreparedImage, decode_image, decode_image_file};
pub use crate::assets::media::{
    AudioPcm, MIX_SAMPLE_RATE, VideoSourceInfo, decode_audio_f32_stereo,
    decode_video_frames_rgba8, ffmpeg_tools_available, probe_duration, probe_video,
};
pub use crate::assets::source::{StillImage, VideoClip, VisualSource};
pub use crate::audio::mix::{AudioManifest, AudioSegment, mix_manifest, write_mix_to_f32le_file};
pub use crate::captions::overlay::{
    BACKGROUND_PAD, BACKGROUND_RISE, BOTTOM_OFFSET, CaptionOverlayBuilder, CaptionStyle,
    LayerRole, OverlayLayer, TEXT_DROP, VisibilityWindow, build_overlay, rounded_box,
};
pub use crate::captions::text::{CaptionTypesetter, TextBlock, find_system_font};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::encode::timeline::{
    FfmpegTimelineSink, FinalOutput, InMemoryTimelineSink, TimelineSink, flatten_timeline,
    render_frame_png,
};
pub use crate::pipeline::coordinator::{RenderThreading, build_thread_pool, compose};
pub use crate::pipeline::job::{ComposeJob, canvas_preset};
pub use crate::render::compositor::TimelineCompositor;
pub use crate::render::frame::FrameRGBA;
pub use crate::scene::model::{
    AssetKind, CaptionSegment, Scene, SceneAsset, derive_local_duration, validate_captions,
};
pub use crate::scene::renderer::{
    AudioTrack, CoverFit, MediaSceneRenderer, RenderedSceneClip, SceneRenderer, VisualTrack,
    ZOOM_RATE, render_scene,
};
pub use crate::timeline::assemble::{PlacedClip, Timeline, assemble, place};
pub use crate::timeline::transition::{TransitionMode, TransitionSpec};
