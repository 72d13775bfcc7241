use std::path::{Path, PathBuf};
use std::process::Command;

use crate::foundation::core::Micros;
use crate::foundation::error::{ReelError, ReelResult};

/// Internal audio sample rate shared by decode, mix and encode.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Basic metadata about a source video file.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    /// Source path used for probing/decoding.
    pub source_path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Native frame-rate numerator (`r_frame_rate`).
    pub fps_num: u32,
    /// Native frame-rate denominator.
    pub fps_den: u32,
    /// Container duration.
    pub duration: Micros,
    /// Whether ffprobe detected at least one audio stream.
    pub has_audio: bool,
}

impl VideoSourceInfo {
    /// Native frame rate, `0.0` when unknown.
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug, Default)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.interleaved_f32.len() / usize::from(self.channels)
        }
    }

    /// Duration implied by the sample count.
    pub fn duration(&self) -> Micros {
        if self.sample_rate == 0 {
            return Micros::ZERO;
        }
        let us = (self.frame_count() as u128 * u128::from(Micros::PER_SEC))
            / u128::from(self.sample_rate);
        Micros(us as u64)
    }
}

/// `true` when both `ffmpeg` and `ffprobe` can be spawned.
pub fn ffmpeg_tools_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .output()
            .is_ok_and(|o| o.status.success())
    })
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

impl ProbeOut {
    fn duration(&self) -> Option<Micros> {
        let from_format = self
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(parse_secs);
        from_format.or_else(|| {
            self.streams
                .iter()
                .filter_map(|s| s.duration.as_deref().and_then(parse_secs))
                .max()
        })
    }
}

fn parse_secs(s: &str) -> Option<Micros> {
    s.trim()
        .parse::<f64>()
        .ok()
        .and_then(|v| Micros::from_secs_f64(v).ok())
}

fn run_ffprobe(path: &Path) -> ReelResult<ProbeOut> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| ReelError::evaluation(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::evaluation(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout)
}

fn parse_probe_json(bytes: &[u8]) -> ReelResult<ProbeOut> {
    serde_json::from_slice(bytes)
        .map_err(|e| ReelError::evaluation(format!("ffprobe json parse failed: {e}")))
}

fn video_info_from_probe(path: &Path, parsed: &ProbeOut) -> ReelResult<VideoSourceInfo> {
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::evaluation("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| ReelError::evaluation("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ReelError::evaluation("missing video height from ffprobe"))?;
    if width == 0 || height == 0 {
        return Err(ReelError::evaluation(format!(
            "video has degenerate size {width}x{height}"
        )));
    }
    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| ReelError::evaluation("invalid video r_frame_rate"))?;
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration: parsed.duration().unwrap_or(Micros::ZERO),
        has_audio,
    })
}

/// Probe source video metadata through `ffprobe`.
#[tracing::instrument(level = "debug", skip_all, fields(path = %source_path.display()))]
pub fn probe_video(source_path: &Path) -> ReelResult<VideoSourceInfo> {
    let parsed = run_ffprobe(source_path)?;
    video_info_from_probe(source_path, &parsed)
}

/// Probe the playable duration of any media file (narration audio in practice).
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn probe_duration(path: &Path) -> ReelResult<Micros> {
    let parsed = run_ffprobe(path)?;
    match parsed.duration() {
        Some(d) if !d.is_zero() => Ok(d),
        _ => Err(ReelError::evaluation(format!(
            "ffprobe reported no usable duration for '{}'",
            path.display()
        ))),
    }
}

/// Decode up to `frame_count` sequential RGBA frames starting at `start`.
///
/// Fewer frames come back when the source ends early.
pub fn decode_video_frames_rgba8(
    source: &VideoSourceInfo,
    start: Micros,
    frame_count: u32,
) -> ReelResult<Vec<Vec<u8>>> {
    if frame_count == 0 {
        return Ok(Vec::new());
    }

    let out = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-ss",
            &format!("{:.6}", start.as_secs_f64()),
        ])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            &frame_count.to_string(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::evaluation(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelError::evaluation(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    split_frames(&out.stdout, source.width, source.height, frame_count)
}

fn split_frames(
    bytes: &[u8],
    width: u32,
    height: u32,
    frame_count: u32,
) -> ReelResult<Vec<Vec<u8>>> {
    let expected_len = width as usize * height as usize * 4;
    if expected_len == 0 {
        return Err(ReelError::evaluation(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if !bytes.len().is_multiple_of(expected_len) {
        return Err(ReelError::evaluation(format!(
            "decoded video batch has invalid size: got {} bytes, expected multiples of {expected_len}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(expected_len)
        .take(frame_count as usize)
        .map(<[u8]>::to_vec)
        .collect())
}

/// Decode audio from a media file to stereo interleaved `f32` PCM at `sample_rate`.
///
/// Files without an audio stream decode to empty PCM.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::evaluation(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        if msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
            || msg.contains("Output file does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels: 2,
                interleaved_f32: Vec::new(),
            });
        }
        return Err(ReelError::evaluation(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: f32le_to_samples(&out.stdout)?,
    })
}

fn f32le_to_samples(bytes: &[u8]) -> ReelResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(ReelError::evaluation(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (a, b) = s.split_once('/')?;
    let a = a.trim().parse::<u32>().ok()?;
    let b = b.trim().parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
