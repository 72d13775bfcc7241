use std::path::PathBuf;
use std::sync::Arc;

use vello_cpu::kurbo::Shape;

use crate::assets::color::CaptionColor;
use crate::captions::text::{CaptionTypesetter, find_system_font};
use crate::foundation::core::{CanvasSpec, Micros, Point};
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::CaptionSegment;

/// Distance between the anchor line and the canvas bottom, added to the text height.
pub const BOTTOM_OFFSET: u32 = 40;
/// Text top sits this far below the anchor.
pub const TEXT_DROP: u32 = 15;
/// Background top sits this far above the anchor.
pub const BACKGROUND_RISE: u32 = 10;
/// Extra background height on top of the text height.
pub const BACKGROUND_PAD: u32 = 40;

/// Caption look shared by every segment of a job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionStyle {
    /// Font file; a well-known system sans-serif is used when unset.
    pub font_path: Option<PathBuf>,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text color.
    pub font_color: CaptionColor,
    /// Backing box width in pixels.
    pub box_width: u32,
    /// Horizontal margin subtracted from `box_width` to get the wrap width.
    pub text_margin: u32,
    /// Backing box alpha, within `[128, 192]`.
    pub box_alpha: u8,
    /// Backing box corner radius in pixels.
    pub corner_radius: f64,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 30.0,
            font_color: CaptionColor::WHITE,
            box_width: 400,
            text_margin: 20,
            box_alpha: 192,
            corner_radius: 20.0,
        }
    }
}

impl CaptionStyle {
    /// Check numeric ranges.
    pub fn validate(&self) -> ReelResult<()> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(ReelError::validation(
                "caption font_size must be finite and > 0",
            ));
        }
        if self.box_width <= self.text_margin {
            return Err(ReelError::validation(format!(
                "caption box_width ({}) must exceed text_margin ({})",
                self.box_width, self.text_margin
            )));
        }
        if u16::try_from(self.box_width).is_err() {
            return Err(ReelError::validation("caption box_width exceeds u16"));
        }
        if !(128..=192).contains(&self.box_alpha) {
            return Err(ReelError::validation(format!(
                "caption box_alpha must be within [128, 192] (got {})",
                self.box_alpha
            )));
        }
        if !self.corner_radius.is_finite() || self.corner_radius < 0.0 {
            return Err(ReelError::validation(
                "caption corner_radius must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Text wrap width.
    pub fn wrap_width(&self) -> u32 {
        self.box_width.saturating_sub(self.text_margin)
    }

    fn resolve_font(&self) -> ReelResult<PathBuf> {
        match &self.font_path {
            Some(p) => Ok(p.clone()),
            None => find_system_font().ok_or_else(|| {
                ReelError::validation("no caption font_path set and no system font found")
            }),
        }
    }
}

/// Half-open scene-local interval `[start, end)` during which a layer renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityWindow {
    /// First visible instant.
    pub start: Micros,
    /// First instant at which the layer is gone.
    pub end: Micros,
}

impl VisibilityWindow {
    /// Build a non-empty window.
    pub fn new(start: Micros, end: Micros) -> ReelResult<Self> {
        if start >= end {
            return Err(ReelError::validation(format!(
                "visibility window start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// `start <= t < end`.
    pub fn contains(&self, t: Micros) -> bool {
        self.start <= t && t < self.end
    }
}

/// What an overlay layer draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerRole {
    /// Rounded backing box.
    Background,
    /// Caption text.
    Text,
}

/// A positioned caption raster with its visibility window.
#[derive(Clone)]
pub struct OverlayLayer {
    /// Background or text.
    pub role: LayerRole,
    /// Top-left corner in canvas pixels.
    pub origin: Point,
    /// When the layer is visible, in scene-local time.
    pub window: VisibilityWindow,
    raster: Arc<vello_cpu::Pixmap>,
}

impl OverlayLayer {
    pub(crate) fn new(
        role: LayerRole,
        origin: Point,
        window: VisibilityWindow,
        raster: Arc<vello_cpu::Pixmap>,
    ) -> Self {
        Self {
            role,
            origin,
            window,
            raster,
        }
    }

    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        u32::from(self.raster.width())
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        u32::from(self.raster.height())
    }

    /// Premultiplied RGBA8 raster bytes.
    pub fn raster_bytes(&self) -> &[u8] {
        self.raster.data_as_u8_slice()
    }

    /// Whether the layer renders at scene-local `t`.
    pub fn visible_at(&self, t: Micros) -> bool {
        self.window.contains(t)
    }

    pub(crate) fn paint(&self) -> vello_cpu::Image {
        vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(self.raster.clone()),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        }
    }
}

/// Builds caption overlays for one scene with a single loaded font.
pub struct CaptionOverlayBuilder {
    canvas: CanvasSpec,
    style: CaptionStyle,
    typesetter: CaptionTypesetter,
}

impl CaptionOverlayBuilder {
    /// Validate the style and load its font.
    pub fn new(canvas: CanvasSpec, style: CaptionStyle) -> ReelResult<Self> {
        style.validate()?;
        let typesetter = CaptionTypesetter::from_font_file(&style.resolve_font()?)?;
        Ok(Self::with_typesetter(canvas, style, typesetter))
    }

    /// Use an already loaded typesetter.
    pub fn with_typesetter(
        canvas: CanvasSpec,
        style: CaptionStyle,
        typesetter: CaptionTypesetter,
    ) -> Self {
        Self {
            canvas,
            style,
            typesetter,
        }
    }

    /// Build `(text, background)` for one segment; `None` for blank text.
    pub fn build(
        &mut self,
        segment: &CaptionSegment,
    ) -> ReelResult<Option<(OverlayLayer, OverlayLayer)>> {
        if segment.text.trim().is_empty() {
            return Ok(None);
        }
        let window = VisibilityWindow::new(segment.start, segment.end)?;

        let style = &self.style;
        let block = self.typesetter.layout(
            segment.text.trim(),
            style.font_size,
            style.font_color,
            style.wrap_width(),
        )?;
        let text_raster = self.typesetter.rasterize(&block)?;

        let h = block.height;
        let bg_height = h + BACKGROUND_PAD;
        let bg_raster = rounded_box(
            style.box_width,
            bg_height,
            style.corner_radius,
            style.box_alpha,
        )?;

        let canvas_w = f64::from(self.canvas.width);
        let anchor = f64::from(self.canvas.height) - f64::from(h) - f64::from(BOTTOM_OFFSET);

        let text = OverlayLayer::new(
            LayerRole::Text,
            Point::new(
                (canvas_w - f64::from(block.width)) / 2.0,
                anchor + f64::from(TEXT_DROP),
            ),
            window,
            text_raster,
        );
        let background = OverlayLayer::new(
            LayerRole::Background,
            Point::new(
                (canvas_w - f64::from(style.box_width)) / 2.0,
                anchor - f64::from(BACKGROUND_RISE),
            ),
            window,
            bg_raster,
        );
        Ok(Some((text, background)))
    }
}

/// One-shot overlay build: loads the style's font and builds a single segment.
pub fn build_overlay(
    segment: &CaptionSegment,
    canvas: CanvasSpec,
    style: &CaptionStyle,
) -> ReelResult<Option<(OverlayLayer, OverlayLayer)>> {
    CaptionOverlayBuilder::new(canvas, style.clone())?.build(segment)
}

/// Semi-transparent black rounded rectangle filling a `width x height` raster.
pub fn rounded_box(
    width: u32,
    height: u32,
    radius: f64,
    alpha: u8,
) -> ReelResult<Arc<vello_cpu::Pixmap>> {
    let w =
        u16::try_from(width).map_err(|_| ReelError::evaluation("background width exceeds u16"))?;
    let h = u16::try_from(height)
        .map_err(|_| ReelError::evaluation("background height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(ReelError::evaluation("background box has zero size"));
    }

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, alpha));
    let rr = vello_cpu::kurbo::RoundedRect::new(0.0, 0.0, f64::from(w), f64::from(h), radius);
    ctx.fill_path(&rr.to_path(0.1));
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    Ok(Arc::new(pixmap))
}

#[cfg(test)]
#[path = "../../tests/unit/captions/overlay.rs"]
mod tests;
