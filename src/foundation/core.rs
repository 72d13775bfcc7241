use crate::foundation::error::{ReelError, ReelResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Largest raster edge supported by the CPU backend (`vello_cpu` surfaces are `u16` sized).
pub const MAX_RASTER_EDGE: u32 = u16::MAX as u32;

/// Timeline instant or duration in whole microseconds.
///
/// All placement arithmetic is integral so timeline totals never drift.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Micros(pub u64);

impl Micros {
    /// Zero duration / timeline origin.
    pub const ZERO: Self = Self(0);
    /// Microseconds per second.
    pub const PER_SEC: u64 = 1_000_000;

    /// Convert seconds to microseconds, rounding to nearest.
    ///
    /// Rejects negative and non-finite input.
    pub fn from_secs_f64(secs: f64) -> ReelResult<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(ReelError::validation(format!(
                "time value must be finite and >= 0 (got {secs})"
            )));
        }
        let us = (secs * Self::PER_SEC as f64).round();
        if us > u64::MAX as f64 {
            return Err(ReelError::validation("time value is out of range"));
        }
        Ok(Self(us as u64))
    }

    /// Whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * Self::PER_SEC)
    }

    /// Whole milliseconds.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms * 1_000)
    }

    /// Value in (fractional) seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / Self::PER_SEC as f64
    }

    /// `true` for the zero duration.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Saturating subtraction.
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Nearest sample index at `sample_rate`.
    pub fn to_sample(self, sample_rate: u32) -> u64 {
        let num = u128::from(self.0) * u128::from(sample_rate);
        let den = u128::from(Self::PER_SEC);
        ((num + den / 2) / den) as u64
    }
}

impl std::fmt::Display for Micros {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

/// Serde adapter storing [`Micros`] as fractional seconds.
pub(crate) mod secs {
    use super::Micros;

    pub(crate) fn serialize<S: serde::Serializer>(v: &Micros, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(v.as_secs_f64())
    }

    pub(crate) fn deserialize<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Micros, D::Error> {
        let v = <f64 as serde::Deserialize>::deserialize(d)?;
        Micros::from_secs_f64(v).map_err(serde::de::Error::custom)
    }
}

/// Zero-based output frame index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 24, den: 1 }
    }
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if den == 0 {
            return Err(ReelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Timeline instant at which frame `index` is sampled (floor to whole microseconds).
    pub fn frame_time(self, index: u64) -> Micros {
        let num = u128::from(index) * u128::from(self.den) * u128::from(Micros::PER_SEC);
        Micros((num / u128::from(self.num)) as u64)
    }

    /// Number of frames needed to cover `duration` (a trailing partial frame counts).
    pub fn frames_for(self, duration: Micros) -> u64 {
        let num = u128::from(duration.0) * u128::from(self.num);
        let den = u128::from(self.den) * u128::from(Micros::PER_SEC);
        num.div_ceil(den) as u64
    }
}

/// Output canvas: pixel size plus output frame rate. Fixed for the lifetime of a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSpec {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Output frame rate.
    #[serde(default)]
    pub fps: Fps,
}

impl Default for CanvasSpec {
    fn default() -> Self {
        Self::landscape()
    }
}

impl CanvasSpec {
    /// 1920x1080 at 24 fps.
    pub fn landscape() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: Fps::default(),
        }
    }

    /// 1080x1920 at 24 fps.
    pub fn portrait() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: Fps::default(),
        }
    }

    /// 1080x1080 at 24 fps.
    pub fn square() -> Self {
        Self {
            width: 1080,
            height: 1080,
            fps: Fps::default(),
        }
    }

    /// Check size and frame-rate invariants.
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("canvas width/height must be > 0"));
        }
        if self.width > MAX_RASTER_EDGE || self.height > MAX_RASTER_EDGE {
            return Err(ReelError::validation(format!(
                "canvas {}x{} exceeds the maximum raster edge of {MAX_RASTER_EDGE}px",
                self.width, self.height
            )));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        Ok(())
    }

    /// Canvas center in pixel space.
    pub fn center(&self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    pub(crate) fn width_u16(&self) -> ReelResult<u16> {
        u16::try_from(self.width).map_err(|_| ReelError::validation("canvas width exceeds u16"))
    }

    pub(crate) fn height_u16(&self) -> ReelResult<u16> {
        u16::try_from(self.height).map_err(|_| ReelError::validation("canvas height exceeds u16"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
