use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::captions::overlay::CaptionStyle;
use crate::foundation::core::{CanvasSpec, Micros};
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::{CaptionSegment, Scene, SceneAsset};
use crate::timeline::transition::TransitionSpec;

/// A full composition request: per-scene inputs plus job-wide settings.
///
/// `assets`, `audio_paths` and `transcripts` are parallel lists indexed by scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposeJob {
    /// Output canvas; an object or one of `"landscape"`, `"portrait"`, `"square"`.
    #[serde(default, deserialize_with = "deserialize_canvas")]
    pub canvas: CanvasSpec,
    /// Transition between adjacent scenes.
    #[serde(default)]
    pub transition: TransitionSpec,
    /// Caption look.
    #[serde(default)]
    pub caption_style: CaptionStyle,
    /// Visual asset per scene.
    pub assets: Vec<SceneAsset>,
    /// Narration audio per scene.
    pub audio_paths: Vec<PathBuf>,
    /// Caption segments per scene.
    pub transcripts: Vec<Vec<CaptionSegment>>,
    /// Output media file.
    pub output: PathBuf,
}

fn deserialize_canvas<'de, D>(deserializer: D) -> Result<CanvasSpec, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Preset(String),
        Spec(CanvasSpec),
    }

    match <Repr as serde::Deserialize>::deserialize(deserializer)? {
        Repr::Spec(c) => Ok(c),
        Repr::Preset(name) => canvas_preset(&name).map_err(serde::de::Error::custom),
    }
}

/// Canvas for a named orientation.
pub fn canvas_preset(name: &str) -> ReelResult<CanvasSpec> {
    match name.trim().to_ascii_lowercase().as_str() {
        "landscape" => Ok(CanvasSpec::landscape()),
        "portrait" => Ok(CanvasSpec::portrait()),
        "square" => Ok(CanvasSpec::square()),
        other => Err(ReelError::validation(format!(
            "unknown canvas preset \"{other}\" (expected landscape, portrait or square)"
        ))),
    }
}

impl ComposeJob {
    /// Load a JSON job file; relative paths resolve against the file's directory.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read job file '{}'", path.display()))?;
        let mut job = Self::from_json_str(&text)?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        job.resolve_paths(base);
        Ok(job)
    }

    /// Parse a JSON job without touching paths.
    pub fn from_json_str(text: &str) -> ReelResult<Self> {
        serde_json::from_str(text).map_err(|e| ReelError::serde(format!("job json: {e}")))
    }

    /// Make every relative path absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for asset in &mut self.assets {
            resolve(&mut asset.path);
        }
        for audio in &mut self.audio_paths {
            resolve(audio);
        }
        if let Some(font) = self.caption_style.font_path.as_mut() {
            resolve(font);
        }
        resolve(&mut self.output);
    }

    /// Number of scenes (when the lists agree).
    pub fn scene_count(&self) -> usize {
        self.assets.len()
    }

    /// Fails with [`ReelError::InputCardinality`] unless the per-scene lists have equal length.
    pub fn check_cardinality(&self) -> ReelResult<()> {
        let (scenes, audio, transcripts) = (
            self.assets.len(),
            self.audio_paths.len(),
            self.transcripts.len(),
        );
        if scenes != audio || scenes != transcripts {
            return Err(ReelError::InputCardinality {
                scenes,
                audio,
                transcripts,
            });
        }
        if scenes == 0 {
            return Err(ReelError::validation("job has no scenes"));
        }
        Ok(())
    }

    /// Cardinality, canvas and caption style checks (no media access).
    pub fn validate(&self) -> ReelResult<()> {
        self.check_cardinality()?;
        self.canvas.validate()?;
        self.caption_style.validate()?;
        Ok(())
    }

    /// Build scenes from probed durations (one per scene, in order).
    pub fn scenes(&self, durations: &[Micros]) -> ReelResult<Vec<Scene>> {
        self.check_cardinality()?;
        if durations.len() != self.assets.len() {
            return Err(ReelError::validation(format!(
                "expected {} scene durations, got {}",
                self.assets.len(),
                durations.len()
            )));
        }
        Ok(self
            .assets
            .iter()
            .zip(&self.audio_paths)
            .zip(&self.transcripts)
            .zip(durations)
            .enumerate()
            .map(|(index, (((asset, audio), captions), &duration))| Scene {
                index,
                asset: asset.clone(),
                audio_path: audio.clone(),
                captions: captions.clone(),
                local_duration: duration,
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/job.rs"]
mod tests;
