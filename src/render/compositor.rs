use crate::foundation::core::{Affine, CanvasSpec, Micros, Vec2};
use crate::foundation::error::ReelResult;
use crate::render::frame::{FrameRGBA, affine_to_cpu};
use crate::timeline::assemble::Timeline;
use crate::timeline::transition::TransitionMode;

/// Flattens a [`Timeline`] into canvas-sized premultiplied frames.
///
/// Active clips draw in z-order. During the head overlap of a non-first clip, a fade draws the
/// whole clip with opacity `p` and a slide shifts it by `-(1 - p) * width`.
pub struct TimelineCompositor {
    canvas: CanvasSpec,
    ctx: vello_cpu::RenderContext,
}

impl TimelineCompositor {
    /// Create a compositor for `canvas`.
    pub fn new(canvas: CanvasSpec) -> ReelResult<Self> {
        canvas.validate()?;
        let ctx = vello_cpu::RenderContext::new(canvas.width_u16()?, canvas.height_u16()?);
        Ok(Self { canvas, ctx })
    }

    /// Output canvas.
    pub fn canvas(&self) -> &CanvasSpec {
        &self.canvas
    }

    /// Render the composite at absolute timeline instant `t`.
    pub fn render_at(&mut self, timeline: &mut Timeline, t: Micros) -> ReelResult<FrameRGBA> {
        let mode = timeline.transition().mode;
        let active = timeline
            .active_at(t)
            .map(|i| (i, timeline.transition_progress(i, t)))
            .collect::<Vec<_>>();

        let width = f64::from(self.canvas.width);
        self.ctx.reset();
        for (i, progress) in active {
            let placed = &mut timeline.clips_mut()[i];
            let local = placed.local_time(t);

            let (shift, opacity) = match (mode, progress) {
                (TransitionMode::Fade, Some(p)) => (0.0, Some(p as f32)),
                (TransitionMode::Slide, Some(p)) => (-(1.0 - p) * width, None),
                _ => (0.0, None),
            };
            let offset = Affine::translate(Vec2::new(shift, 0.0));

            if let Some(alpha) = opacity {
                self.ctx.push_opacity_layer(alpha);
            }

            let visual = &mut placed.clip.visual;
            let (src_w, src_h) = visual.fit().source;
            let image = visual.frame_at(local)?;
            self.ctx
                .set_transform(affine_to_cpu(offset * visual.transform_at(local)));
            self.ctx.set_paint(image);
            self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(src_w),
                f64::from(src_h),
            ));

            for layer in placed.clip.visible_overlays(local) {
                let at = offset * Affine::translate(layer.origin.to_vec2());
                self.ctx.set_transform(affine_to_cpu(at));
                self.ctx.set_paint(layer.paint());
                self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(layer.width()),
                    f64::from(layer.height()),
                ));
            }

            if opacity.is_some() {
                self.ctx.pop_layer();
            }
        }
        self.ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(self.canvas.width_u16()?, self.canvas.height_u16()?);
        self.ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
