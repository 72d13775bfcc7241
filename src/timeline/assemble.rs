use crate::foundation::core::Micros;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::renderer::RenderedSceneClip;
use crate::timeline::transition::TransitionSpec;

/// A rendered clip with its absolute placement on the timeline.
#[derive(Debug)]
pub struct PlacedClip {
    /// The clip; its content is never truncated by placement.
    pub clip: RenderedSceneClip,
    /// Absolute start.
    pub start: Micros,
    /// Absolute end, always `start + clip.local_duration`.
    pub end: Micros,
}

impl PlacedClip {
    /// `start <= t < end`.
    pub fn is_active_at(&self, t: Micros) -> bool {
        self.start <= t && t < self.end
    }

    /// Clip-local time for absolute `t` (saturates at zero before the start).
    pub fn local_time(&self, t: Micros) -> Micros {
        t.saturating_sub(self.start)
    }
}

/// Ordered placed clips; later entries draw on top where ranges intersect.
#[derive(Debug)]
pub struct Timeline {
    clips: Vec<PlacedClip>,
    transition: TransitionSpec,
}

impl Timeline {
    /// Placed clips in z-order.
    pub fn clips(&self) -> &[PlacedClip] {
        &self.clips
    }

    /// Mutable access, used while flattening (video sources decode lazily).
    pub fn clips_mut(&mut self) -> &mut [PlacedClip] {
        &mut self.clips
    }

    /// Effective transition (zero overlap reported as a cut).
    pub fn transition(&self) -> TransitionSpec {
        self.transition
    }

    /// Number of placed clips.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Always `false` for an assembled timeline.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// End of the last clip.
    pub fn total_duration(&self) -> Micros {
        self.clips.last().map_or(Micros::ZERO, |c| c.end)
    }

    /// Indices of clips active at absolute `t`, in z-order.
    pub fn active_at(&self, t: Micros) -> impl Iterator<Item = usize> + '_ {
        self.clips
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.is_active_at(t))
            .map(|(i, _)| i)
    }

    /// Progress `0..1` of the incoming transition of clip `i` at absolute `t`.
    ///
    /// `None` for the first clip, for cuts, and outside the head overlap.
    pub fn transition_progress(&self, i: usize, t: Micros) -> Option<f64> {
        let overlap = self.transition.effective_overlap();
        if i == 0 || overlap.is_zero() {
            return None;
        }
        let placed = self.clips.get(i)?;
        let local = placed.local_time(t);
        if t < placed.start || local >= overlap {
            return None;
        }
        Some(local.0 as f64 / overlap.0 as f64)
    }
}

/// Absolute `(start, end)` for clips of the given durations.
///
/// The first clip starts at zero; every later clip starts `overlap` before the previous end.
pub fn place(durations: &[Micros], transition: &TransitionSpec) -> ReelResult<Vec<(Micros, Micros)>> {
    if durations.is_empty() {
        return Err(ReelError::validation("cannot assemble an empty clip list"));
    }
    if let Some(i) = durations.iter().position(|d| d.is_zero()) {
        return Err(ReelError::validation(format!("clip {i} has zero duration")));
    }
    transition.validate_against(durations)?;

    let overlap = transition.effective_overlap();
    let mut out = Vec::with_capacity(durations.len());
    let mut prev_end: Option<Micros> = None;
    for &d in durations {
        let start = prev_end.map_or(Micros::ZERO, |e| e.saturating_sub(overlap));
        let end = start
            .checked_add(d)
            .ok_or_else(|| ReelError::validation("timeline duration overflows"))?;
        out.push((start, end));
        prev_end = Some(end);
    }
    Ok(out)
}

/// Place rendered clips on one timeline.
///
/// Fails with [`ReelError::InvalidTransition`] when the overlap is not shorter than every clip.
#[tracing::instrument(level = "info", skip_all, fields(clips = clips.len(), mode = %transition.mode))]
pub fn assemble(clips: Vec<RenderedSceneClip>, transition: TransitionSpec) -> ReelResult<Timeline> {
    let durations = clips.iter().map(|c| c.local_duration).collect::<Vec<_>>();
    let placements = place(&durations, &transition)?;

    let effective = TransitionSpec {
        mode: transition.effective_mode(),
        overlap: transition.effective_overlap(),
    };
    let clips = clips
        .into_iter()
        .zip(placements)
        .map(|(clip, (start, end))| {
            tracing::debug!(scene = clip.source_index, %start, %end, "placed clip");
            PlacedClip { clip, start, end }
        })
        .collect::<Vec<_>>();

    let timeline = Timeline {
        clips,
        transition: effective,
    };
    tracing::info!(total = %timeline.total_duration(), "timeline assembled");
    Ok(timeline)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/assemble.rs"]
mod tests;
