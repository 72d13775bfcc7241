use std::path::Path;
use std::sync::Arc;

use crate::assets::media::MIX_SAMPLE_RATE;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::assemble::Timeline;

/// Narration placed on the timeline, ready to mix.
#[derive(Clone, Debug)]
pub struct AudioSegment {
    /// Scene the narration belongs to.
    pub scene: usize,
    /// First output sample frame.
    pub timeline_start_sample: u64,
    /// Source channel count (1 or 2).
    pub source_channels: u16,
    /// Interleaved source PCM at the manifest rate.
    pub source_interleaved_f32: Arc<Vec<f32>>,
}

/// Every placed narration track of a timeline.
#[derive(Clone, Debug)]
pub struct AudioManifest {
    /// Output sample rate.
    pub sample_rate: u32,
    /// Output channel count.
    pub channels: u16,
    /// Output length in sample frames.
    pub total_samples: u64,
    /// Segments in timeline order.
    pub segments: Vec<AudioSegment>,
}

impl AudioManifest {
    /// Collect each clip's narration at its absolute start.
    pub fn from_timeline(timeline: &Timeline) -> ReelResult<Self> {
        let mut segments = Vec::with_capacity(timeline.len());
        for placed in timeline.clips() {
            let audio = &placed.clip.audio;
            if audio.sample_rate != MIX_SAMPLE_RATE {
                return Err(ReelError::evaluation(format!(
                    "scene {} audio is {} Hz, expected {MIX_SAMPLE_RATE} Hz",
                    placed.clip.source_index, audio.sample_rate
                )));
            }
            segments.push(AudioSegment {
                scene: placed.clip.source_index,
                timeline_start_sample: placed.start.to_sample(MIX_SAMPLE_RATE),
                source_channels: audio.channels,
                source_interleaved_f32: audio.samples.clone(),
            });
        }
        Ok(Self {
            sample_rate: MIX_SAMPLE_RATE,
            channels: 2,
            total_samples: timeline.total_duration().to_sample(MIX_SAMPLE_RATE),
            segments,
        })
    }
}

/// Sum every segment into interleaved output PCM, clamped to `[-1, 1]`.
pub fn mix_manifest(manifest: &AudioManifest) -> Vec<f32> {
    let frames = manifest.total_samples as usize;
    let mut out = vec![0.0f32; frames * usize::from(manifest.channels)];

    for seg in &manifest.segments {
        mix_segment(&mut out, manifest, seg);
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

fn mix_segment(out: &mut [f32], manifest: &AudioManifest, seg: &AudioSegment) {
    let src_channels = usize::from(seg.source_channels.max(1));
    let dst_channels = usize::from(manifest.channels);
    let src = seg.source_interleaved_f32.as_slice();

    let start = seg.timeline_start_sample as usize;
    for (rel, frame) in src.chunks_exact(src_channels).enumerate() {
        let dst_idx = (start + rel) * dst_channels;
        if dst_idx + dst_channels > out.len() {
            break;
        }
        let (l, r) = if src_channels == 1 {
            (frame[0], frame[0])
        } else {
            (frame[0], frame[1])
        };
        out[dst_idx] += l;
        if dst_channels > 1 {
            out[dst_idx + 1] += r;
        }
    }
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::evaluation(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::evaluation(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
