use std::sync::Arc;

use crate::foundation::core::{Affine, Canvas, Point, Rect, RoundedRect};
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::render::blur::{blur_params, blur_rgba8_premul};
use crate::render::composite::over_in_place;
use crate::render::frame::FrameRGBA;
use crate::render::text::{FontBook, MeasuredText, TextLayoutEngine};
use crate::theme::color::Color;
use crate::theme::resolve::{Fill, ResolvedStyle};
use crate::timeline::chunk::WordChunk;

/// Pulse amplitude as a fraction of the chunk scale.
const PULSE_AMPLITUDE: f64 = 0.04;
/// Pulse period.
const PULSE_PERIOD_MS: f64 = 1000.0;

/// Surface-independent knobs of the caption renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    /// Distance from the surface bottom to the caption centre line.
    pub bottom_offset_px: f64,
    /// Multiplier on caption box alpha, on top of chunk opacity.
    pub background_opacity: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            bottom_offset_px: 50.0,
            background_opacity: 0.8,
        }
    }
}

/// Geometry of one caption, before the animation transform is applied.
#[derive(Clone, Debug)]
pub struct ChunkLayout {
    /// Text after the style's case transform.
    pub text: String,
    /// Background box.
    pub box_rect: Rect,
    /// Top-left of the text line box.
    pub text_origin: Point,
    /// Scale/slide/pulse transform around the box centre.
    pub transform: Affine,
    /// Text metrics and glyphs.
    pub measured: MeasuredText,
}

/// Scale multiplier of the pulse animation at `t_ms`.
pub fn pulse_factor(t_ms: u64) -> f64 {
    let phase = (t_ms as f64 % PULSE_PERIOD_MS) / PULSE_PERIOD_MS;
    1.0 + PULSE_AMPLITUDE * (phase * std::f64::consts::TAU).sin()
}

/// Paints a source frame plus animated caption chunks onto an RGBA surface.
///
/// Output depends only on `(source, chunks, t_ms, style)` and the renderer's fonts and
/// settings, so live preview and export produce identical pixels for identical input.
pub struct FrameRenderer {
    fonts: Arc<FontBook>,
    settings: RenderSettings,
    text: TextLayoutEngine,
    scratch: Option<Scratch>,
}

struct Scratch {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    layer: vello_cpu::Pixmap,
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("fonts", &self.fonts)
            .field("settings", &self.settings)
            .finish()
    }
}

impl FrameRenderer {
    /// Create a renderer using `fonts`.
    pub fn new(fonts: Arc<FontBook>, settings: RenderSettings) -> Self {
        Self {
            fonts,
            settings,
            text: TextLayoutEngine::new(),
            scratch: None,
        }
    }

    /// Renderer settings.
    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    /// Render into a fresh surface of size `canvas`.
    pub fn render(
        &mut self,
        canvas: Canvas,
        source: Option<&FrameRGBA>,
        chunks: &[WordChunk],
        t_ms: u64,
        style: &ResolvedStyle,
    ) -> CaptionResult<FrameRGBA> {
        let mut surface = FrameRGBA::transparent(canvas);
        self.render_into(&mut surface, source, chunks, t_ms, style)?;
        Ok(surface)
    }

    /// Overwrite `surface` with the scaled source frame (or transparency), then paint
    /// each chunk in order, later chunks on top.
    #[tracing::instrument(skip_all, fields(t_ms = t_ms, chunks = chunks.len()))]
    pub fn render_into(
        &mut self,
        surface: &mut FrameRGBA,
        source: Option<&FrameRGBA>,
        chunks: &[WordChunk],
        t_ms: u64,
        style: &ResolvedStyle,
    ) -> CaptionResult<()> {
        surface.validate()?;
        if !surface.premultiplied {
            return Err(CaptionError::render("target surface must be premultiplied"));
        }
        self.ensure_scratch(surface.width, surface.height)?;
        self.paint_source(surface, source)?;

        for chunk in chunks {
            if chunk.opacity <= 0.0 {
                continue;
            }
            let layout = self.layout_chunk(surface.canvas(), chunk, t_ms, style)?;
            self.paint_chunk(surface, &layout, chunk.opacity, style)?;
        }
        Ok(())
    }

    /// Compute where `chunk` lands on a surface of size `canvas`.
    pub fn layout_chunk(
        &mut self,
        canvas: Canvas,
        chunk: &WordChunk,
        t_ms: u64,
        style: &ResolvedStyle,
    ) -> CaptionResult<ChunkLayout> {
        let text = style.text_transform.apply(&chunk.text).into_owned();
        let measured =
            self.text
                .measure(&self.fonts, &style.font_families, &text, style.font_size_px)?;

        let (tw, th) = (measured.width(), measured.height());
        let bw = tw + 2.0 * f64::from(style.padding.horizontal);
        let bh = th + 2.0 * f64::from(style.padding.vertical);
        let cx = f64::from(canvas.width) / 2.0;
        let cy = f64::from(canvas.height) - self.settings.bottom_offset_px;

        let mut scale = f64::from(chunk.scale);
        if style.pulse {
            scale *= pulse_factor(t_ms);
        }
        let transform = Affine::translate((cx, cy + f64::from(chunk.translate_y)))
            * Affine::scale(scale)
            * Affine::translate((-cx, -cy));

        Ok(ChunkLayout {
            text,
            box_rect: Rect::new(cx - bw / 2.0, cy - bh / 2.0, cx + bw / 2.0, cy + bh / 2.0),
            text_origin: Point::new(cx - tw / 2.0, cy - th / 2.0),
            transform,
            measured,
        })
    }

    fn ensure_scratch(&mut self, width: u32, height: u32) -> CaptionResult<()> {
        let w: u16 = width
            .try_into()
            .map_err(|_| CaptionError::render("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| CaptionError::render("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(CaptionError::render("surface must be non-empty"));
        }
        match &self.scratch {
            Some(s) if s.width == w && s.height == h => {}
            _ => {
                self.scratch = Some(Scratch {
                    width: w,
                    height: h,
                    ctx: vello_cpu::RenderContext::new(w, h),
                    layer: vello_cpu::Pixmap::new(w, h),
                });
            }
        }
        Ok(())
    }

    fn scratch(&mut self) -> CaptionResult<&mut Scratch> {
        self.scratch
            .as_mut()
            .ok_or_else(|| CaptionError::render("render scratch not initialized"))
    }

    fn paint_source(&mut self, surface: &mut FrameRGBA, source: Option<&FrameRGBA>) -> CaptionResult<()> {
        let Some(src) = source else {
            surface.data.fill(0);
            return Ok(());
        };
        src.validate()?;
        let src_premul;
        let src = if src.premultiplied {
            src
        } else {
            src_premul = FrameRGBA::from_straight(src.width, src.height, src.data.clone())?;
            &src_premul
        };
        if src.width == surface.width && src.height == surface.height {
            surface.data.copy_from_slice(&src.data);
            return Ok(());
        }

        let image = image_from_frame(src)?;
        let sx = f64::from(surface.width) / f64::from(src.width);
        let sy = f64::from(surface.height) / f64::from(src.height);
        let s = self.scratch()?;
        s.ctx.reset();
        s.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        s.ctx
            .set_transform(vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy));
        s.ctx.set_paint(image);
        s.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(src.width),
            f64::from(src.height),
        ));
        flush_layer(s);
        surface
            .data
            .copy_from_slice(s.layer.data_as_u8_slice());
        Ok(())
    }

    fn paint_chunk(
        &mut self,
        surface: &mut FrameRGBA,
        layout: &ChunkLayout,
        opacity: f32,
        style: &ResolvedStyle,
    ) -> CaptionResult<()> {
        let background_opacity = f64::from(self.settings.background_opacity);
        let s = self.scratch()?;

        if style.background != Fill::None {
            s.ctx.reset();
            paint_box(s, layout, style, background_opacity);
            flush_layer(s);
            over_in_place(&mut surface.data, s.layer.data_as_u8_slice(), opacity)?;
        }

        let MeasuredText::Shaped { face, line } = &layout.measured else {
            return Ok(());
        };
        let glyph_pass = |s: &mut Scratch, offset: (f64, f64), color: Color| {
            s.ctx.reset();
            s.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            s.ctx.set_transform(affine_to_cpu(
                layout.transform
                    * Affine::translate((
                        layout.text_origin.x + offset.0,
                        layout.text_origin.y + offset.1,
                    )),
            ));
            s.ctx.set_paint(cpu_color(color));
            s.ctx
                .glyph_run(face.font_data())
                .font_size(line.font_size)
                .fill_glyphs(line.glyphs.iter().copied());
            flush_layer(s);
        };

        if let Some(shadow) = style.shadow
            && !shadow.color.is_invisible()
        {
            glyph_pass(
                &mut *s,
                (f64::from(shadow.offset_x), f64::from(shadow.offset_y)),
                shadow.color,
            );
            let (radius, sigma) = blur_params(f64::from(shadow.blur));
            if radius > 0 {
                let blurred = blur_rgba8_premul(
                    s.layer.data_as_u8_slice(),
                    u32::from(s.width),
                    u32::from(s.height),
                    radius,
                    sigma,
                )?;
                over_in_place(&mut surface.data, &blurred, opacity)?;
            } else {
                over_in_place(&mut surface.data, s.layer.data_as_u8_slice(), opacity)?;
            }
        }

        glyph_pass(&mut *s, (0.0, 0.0), style.text_color);
        over_in_place(&mut surface.data, s.layer.data_as_u8_slice(), opacity)?;
        Ok(())
    }
}

fn paint_box(
    s: &mut Scratch,
    layout: &ChunkLayout,
    style: &ResolvedStyle,
    background_opacity: f64,
) {
    let r = layout.box_rect;
    let (w, h) = (r.width(), r.height());
    s.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    s.ctx
        .set_transform(affine_to_cpu(layout.transform * Affine::translate((r.x0, r.y0))));
    match style.background {
        Fill::None => return,
        Fill::Solid(c) => s.ctx.set_paint(cpu_color(c.with_alpha_mul(background_opacity))),
        Fill::LinearX { from, to } => s.ctx.set_paint(
            vello_cpu::peniko::Gradient::new_linear((0.0, 0.0), (w.max(1.0), 0.0)).with_stops([
                cpu_color(from.with_alpha_mul(background_opacity)),
                cpu_color(to.with_alpha_mul(background_opacity)),
            ]),
        ),
    }
    let radius = f64::from(style.radius_px).min(w / 2.0).min(h / 2.0);
    if radius > 0.0 {
        let rr = RoundedRect::new(0.0, 0.0, w, h, radius);
        let mut path = vello_cpu::kurbo::BezPath::new();
        for el in kurbo::Shape::path_elements(&rr, 0.1) {
            path.push(el);
        }
        s.ctx.fill_path(&path);
    } else {
        s.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
    }
}

fn flush_layer(s: &mut Scratch) {
    s.layer.data_as_u8_slice_mut().fill(0);
    s.ctx.flush();
    s.ctx.render_to_pixmap(&mut s.layer);
}

fn image_from_frame(frame: &FrameRGBA) -> CaptionResult<vello_cpu::Image> {
    image_from_premul(&frame.data, frame.width, frame.height)
}

fn image_from_premul(bytes: &[u8], width: u32, height: u32) -> CaptionResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CaptionError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CaptionError::render("image height exceeds u16"))?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(CaptionError::render("image byte length mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn cpu_color(c: Color) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/caption.rs"]
mod tests;
