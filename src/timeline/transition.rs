use crate::foundation::core::Micros;
use crate::foundation::error::{ReelError, ReelResult};

/// How adjacent clips meet on the timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionMode {
    /// Back-to-back, no overlap.
    Cut,
    /// Incoming clip ramps opacity 0 to 1 across the overlap.
    #[default]
    Fade,
    /// Incoming clip slides in from the left edge across the overlap.
    Slide,
}

impl TransitionMode {
    /// Case-insensitive parse of `cut`, `fade` or `slide`.
    pub fn parse(s: &str) -> ReelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cut" => Ok(Self::Cut),
            "fade" | "crossfade" => Ok(Self::Fade),
            "slide" => Ok(Self::Slide),
            other => Err(ReelError::validation(format!(
                "unknown transition mode \"{other}\" (expected cut, fade or slide)"
            ))),
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cut => "cut",
            Self::Fade => "fade",
            Self::Slide => "slide",
        }
    }
}

impl std::str::FromStr for TransitionMode {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for TransitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for TransitionMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Transition applied between every pair of adjacent clips.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransitionSpec {
    /// Cut, fade or slide.
    pub mode: TransitionMode,
    /// Overlap between adjacent clips; ignored for cuts.
    #[serde(rename = "overlap_secs", with = "crate::foundation::core::secs")]
    pub overlap: Micros,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self {
            mode: TransitionMode::Fade,
            overlap: Micros::from_secs(1),
        }
    }
}

impl TransitionSpec {
    /// Hard cut.
    pub fn cut() -> Self {
        Self {
            mode: TransitionMode::Cut,
            overlap: Micros::ZERO,
        }
    }

    /// Crossfade with the given overlap.
    pub fn fade(overlap: Micros) -> Self {
        Self {
            mode: TransitionMode::Fade,
            overlap,
        }
    }

    /// Slide-in with the given overlap.
    pub fn slide(overlap: Micros) -> Self {
        Self {
            mode: TransitionMode::Slide,
            overlap,
        }
    }

    /// Overlap actually applied between clips: zero for cuts.
    pub fn effective_overlap(&self) -> Micros {
        match self.mode {
            TransitionMode::Cut => Micros::ZERO,
            TransitionMode::Fade | TransitionMode::Slide => self.overlap,
        }
    }

    /// Mode actually applied: a zero overlap behaves as a cut.
    pub fn effective_mode(&self) -> TransitionMode {
        if self.effective_overlap().is_zero() {
            TransitionMode::Cut
        } else {
            self.mode
        }
    }

    /// Check the overlap against clip durations: it must be shorter than the shortest clip.
    ///
    /// A single clip has no join, so any overlap is accepted.
    pub fn validate_against(&self, durations: &[Micros]) -> ReelResult<()> {
        let overlap = self.effective_overlap();
        if overlap.is_zero() || durations.len() < 2 {
            return Ok(());
        }
        let Some((scene, shortest)) = durations
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|(_, d)| *d)
        else {
            return Ok(());
        };
        if overlap >= shortest {
            return Err(ReelError::InvalidTransition {
                overlap,
                shortest,
                scene,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/transition.rs"]
mod tests;
