use std::path::PathBuf;

use crate::foundation::core::{Micros, secs};
use crate::foundation::error::{ReelError, ReelResult};

/// Kind of visual asset backing a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Static image, shown for the whole scene.
    Image,
    /// Short video clip.
    #[serde(alias = "video_clip", alias = "clip")]
    Video,
}

/// A scene's visual asset.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneAsset {
    /// Image or video.
    pub kind: AssetKind,
    /// Filesystem path.
    pub path: PathBuf,
}

impl SceneAsset {
    /// Image asset at `path`.
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: AssetKind::Image,
            path: path.into(),
        }
    }

    /// Video asset at `path`.
    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: AssetKind::Video,
            path: path.into(),
        }
    }
}

/// One timed caption, relative to the owning scene's start.
///
/// Serialized with `start`/`end` in seconds.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptionSegment {
    /// First visible instant.
    #[serde(with = "secs")]
    pub start: Micros,
    /// First instant at which the caption is gone.
    #[serde(with = "secs")]
    pub end: Micros,
    /// Caption text.
    pub text: String,
}

/// Everything needed to render one scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scene {
    /// Position in the job, also the z-order on the timeline.
    pub index: usize,
    /// Visual asset.
    pub asset: SceneAsset,
    /// Narration audio path.
    pub audio_path: PathBuf,
    /// Transcript segments in scene-local time.
    pub captions: Vec<CaptionSegment>,
    /// Scene length on the timeline.
    pub local_duration: Micros,
}

/// Scene length: the narration length for images, the longer of narration and clip for videos.
pub fn derive_local_duration(
    kind: AssetKind,
    audio: Micros,
    source: Option<Micros>,
) -> Micros {
    match kind {
        AssetKind::Image => audio,
        AssetKind::Video => audio.max(source.unwrap_or(Micros::ZERO)),
    }
}

/// Check a scene transcript and clamp segment ends to the scene length.
///
/// Segments must satisfy `start < end`, be ordered by start, not overlap, and start before
/// `duration`.
pub fn validate_captions(
    scene: usize,
    captions: &[CaptionSegment],
    duration: Micros,
) -> ReelResult<Vec<CaptionSegment>> {
    let mut out = Vec::with_capacity(captions.len());
    let mut prev_end: Option<Micros> = None;
    for (i, seg) in captions.iter().enumerate() {
        if seg.start >= seg.end {
            return Err(ReelError::caption(
                scene,
                i,
                format!("start {} must be before end {}", seg.start, seg.end),
            ));
        }
        if let Some(prev) = prev_end
            && seg.start < prev
        {
            return Err(ReelError::caption(
                scene,
                i,
                format!(
                    "segment starts at {} before the previous one ends at {prev}",
                    seg.start
                ),
            ));
        }
        if seg.start >= duration {
            return Err(ReelError::caption(
                scene,
                i,
                format!("start {} is not inside the scene ({duration})", seg.start),
            ));
        }
        prev_end = Some(seg.end);
        out.push(CaptionSegment {
            start: seg.start,
            end: seg.end.min(duration),
            text: seg.text.clone(),
        });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
