use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{CaptionError, CaptionResult};

/// Tightly packed RGBA8 raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major pixel bytes, 4 per pixel.
    pub data: Vec<u8>,
    /// Whether color channels are premultiplied by alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied surface.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgba_len()],
            premultiplied: true,
        }
    }

    /// Premultiplied surface filled with `rgba`.
    pub fn solid(canvas: Canvas, rgba: [u8; 4]) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: rgba.repeat(canvas.width as usize * canvas.height as usize),
            premultiplied: true,
        }
    }

    /// Wrap straight-alpha bytes (as decoded from media) and premultiply them.
    pub fn from_straight(width: u32, height: u32, mut data: Vec<u8>) -> CaptionResult<Self> {
        check_len(width, height, data.len())?;
        for px in data.chunks_exact_mut(4) {
            if px[3] == 255 {
                continue;
            }
            let premul = Rgba8Premul::from_straight_rgba(px[0], px[1], px[2], px[3]);
            px.copy_from_slice(&premul.to_array());
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// Surface dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Check that `data` matches `width * height * 4`.
    pub fn validate(&self) -> CaptionResult<()> {
        check_len(self.width, self.height, self.data.len())
    }

    /// Pixel at `(x, y)`, if inside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha copy of the pixel data, suitable for PNG output.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if !self.premultiplied {
            return out;
        }
        for px in out.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }

    /// Composite over an opaque `bg`, yielding straight RGBA8 with alpha 255.
    ///
    /// Encoders expect opaque frames; premultiplied pixels are flattened with
    /// `out = src + bg * (1 - a)`.
    pub fn flatten_over(&self, bg: [u8; 4]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        self.flatten_over_into(bg, &mut out);
        out
    }

    /// [`FrameRGBA::flatten_over`] into a reused buffer; `out` is cleared first.
    pub fn flatten_over_into(&self, bg: [u8; 4], out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.data.len());
        for px in self.data.chunks_exact(4) {
            let a = u16::from(px[3]);
            let inv = 255 - a;
            for (c, &b) in px[..3].iter().zip(&bg[..3]) {
                let src = if self.premultiplied {
                    u16::from(*c)
                } else {
                    u16::from(crate::foundation::math::mul_div255_u8(u16::from(*c), a))
                };
                let v = src + crate::foundation::math::mul_div255_u16(u16::from(b), inv);
                out.push(v.min(255) as u8);
            }
            out.push(255);
        }
    }
}

fn check_len(width: u32, height: u32, len: usize) -> CaptionResult<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| CaptionError::render("frame buffer size overflow"))?;
    if len != expected {
        return Err(CaptionError::render(format!(
            "frame buffer is {len} bytes, expected {expected} for {width}x{height}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
