use std::path::PathBuf;

use crate::foundation::core::Micros;

/// Convenience result type used across storyreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Scene, narration and transcript lists disagree in length.
    #[error(
        "input cardinality error: {scenes} scenes, {audio} audio paths, {transcripts} transcripts"
    )]
    InputCardinality {
        /// Number of scene assets supplied.
        scenes: usize,
        /// Number of narration audio paths supplied.
        audio: usize,
        /// Number of transcripts supplied.
        transcripts: usize,
    },

    /// A scene's visual asset could not be opened or decoded.
    #[error("asset decode error: scene {scene}, '{}': {source:#}", .path.display())]
    AssetDecode {
        /// Index of the failing scene.
        scene: usize,
        /// Asset path.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: anyhow::Error,
    },

    /// A scene's narration audio could not be opened or decoded.
    #[error("audio decode error: scene {scene}, '{}': {source:#}", .path.display())]
    AudioDecode {
        /// Index of the failing scene.
        scene: usize,
        /// Audio path.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: anyhow::Error,
    },

    /// Transition overlap is not shorter than the shortest clip.
    #[error(
        "invalid transition: overlap {overlap} must be shorter than the shortest clip ({shortest}, scene {scene})"
    )]
    InvalidTransition {
        /// Requested overlap.
        overlap: Micros,
        /// Duration of the shortest clip.
        shortest: Micros,
        /// Index of the shortest clip.
        scene: usize,
    },

    /// A caption segment is malformed or its overlay could not be built.
    #[error("caption overlay error: scene {scene}, segment {segment}: {reason}")]
    CaptionOverlay {
        /// Index of the owning scene.
        scene: usize,
        /// Index of the segment inside the scene transcript.
        segment: usize,
        /// What went wrong.
        reason: String,
    },

    /// The encode sink failed.
    #[error("encode error: {source:#}")]
    Encode {
        /// Underlying sink error.
        #[source]
        source: anyhow::Error,
    },

    /// Invalid user-provided job data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while rendering or flattening frames.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`ReelError::AssetDecode`] value.
    pub fn asset_decode(
        scene: usize,
        path: impl Into<PathBuf>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::AssetDecode {
            scene,
            path: path.into(),
            source: source.into(),
        }
    }

    /// Build a [`ReelError::AudioDecode`] value.
    pub fn audio_decode(
        scene: usize,
        path: impl Into<PathBuf>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::AudioDecode {
            scene,
            path: path.into(),
            source: source.into(),
        }
    }

    /// Build a [`ReelError::CaptionOverlay`] value.
    pub fn caption(scene: usize, segment: usize, reason: impl Into<String>) -> Self {
        Self::CaptionOverlay {
            scene,
            segment,
            reason: reason.into(),
        }
    }

    /// Wrap a sink failure as [`ReelError::Encode`]; already-wrapped errors pass through.
    pub fn encode(err: ReelError) -> Self {
        match err {
            e @ Self::Encode { .. } => e,
            other => Self::Encode {
                source: anyhow::Error::new(other),
            },
        }
    }

    /// Scene index the error is attributed to, when known.
    pub fn scene_index(&self) -> Option<usize> {
        match self {
            Self::AssetDecode { scene, .. }
            | Self::AudioDecode { scene, .. }
            | Self::InvalidTransition { scene, .. }
            | Self::CaptionOverlay { scene, .. } => Some(*scene),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
