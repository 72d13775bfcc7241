use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::assets::color::CaptionColor;
use crate::foundation::error::{ReelError, ReelResult};

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First well-known sans-serif font file present on this machine.
pub fn find_system_font() -> Option<PathBuf> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Shapes caption text with one fixed font.
///
/// Owns its Parley contexts; one typesetter per scene render.
pub struct CaptionTypesetter {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<CaptionColor>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl CaptionTypesetter {
    /// Load a font file (TTF/OTF).
    pub fn from_font_file(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read caption font '{}'", path.display()))?;
        Self::from_font_bytes(bytes)
    }

    /// Register raw font bytes.
    pub fn from_font_bytes(bytes: Vec<u8>) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| ReelError::validation("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
        })
    }

    /// Family name resolved from the registered font.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape `text`, wrap it to `wrap_width` and center every line inside that width.
    pub fn layout(
        &mut self,
        text: &str,
        font_size: f32,
        color: CaptionColor,
        wrap_width: u32,
    ) -> ReelResult<TextBlock> {
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(ReelError::validation("font_size must be finite and > 0"));
        }
        if wrap_width == 0 {
            return Err(ReelError::validation("text wrap width must be > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font_size));
        builder.push_default(parley::style::StyleProperty::Brush(color));

        let wrap = wrap_width as f32;
        let mut layout: parley::Layout<CaptionColor> = builder.build(text);
        layout.break_all_lines(Some(wrap));
        layout.align(
            Some(wrap),
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            let dx = ((wrap - line.metrics().advance) / 2.0).max(0.0);
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x + dx,
                    y: g.y,
                }));
            }
        }

        Ok(TextBlock {
            width: wrap_width,
            height: (layout.height().ceil() as u32).max(1),
            font_size,
            color,
            glyphs,
        })
    }

    /// Rasterize a laid out block into a transparent pixmap of exactly the block's size.
    pub fn rasterize(&self, block: &TextBlock) -> ReelResult<Arc<vello_cpu::Pixmap>> {
        let w = u16::try_from(block.width)
            .map_err(|_| ReelError::evaluation("text block width exceeds u16"))?;
        let h = u16::try_from(block.height)
            .map_err(|_| ReelError::evaluation("text block height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        let c = block.color;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
        ctx.glyph_run(&self.font)
            .font_size(block.font_size)
            .fill_glyphs(block.glyphs.iter().cloned());
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(Arc::new(pixmap))
    }
}

/// Shaped, wrapped and centered caption text.
#[derive(Clone)]
pub struct TextBlock {
    /// Block width (the wrap width).
    pub width: u32,
    /// Measured block height, at least one pixel.
    pub height: u32,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text color.
    pub color: CaptionColor,
    glyphs: Vec<vello_cpu::Glyph>,
}

impl TextBlock {
    /// Number of positioned glyphs.
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/captions/text.rs"]
mod tests;
