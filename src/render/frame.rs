use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;

/// CPU frame buffer in RGBA8 format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA bytes of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Copy of this frame composited over an opaque `bg` color.
    pub fn flattened_over(&self, bg: [u8; 3]) -> ReelResult<FrameRGBA> {
        if !self.premultiplied {
            return Err(ReelError::evaluation(
                "flattening expects a premultiplied frame",
            ));
        }
        let mut data = vec![0u8; self.data.len()];
        flatten_premul_over_bg_to_opaque_rgba8(&mut data, &self.data, bg)?;
        Ok(FrameRGBA {
            width: self.width,
            height: self.height,
            data,
            premultiplied: false,
        })
    }
}

/// Composite premultiplied RGBA8 over an opaque background, producing opaque straight RGBA8.
pub(crate) fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg: [u8; 3],
) -> ReelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255_u16(u16::from(bg[c]), inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

pub(crate) fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
