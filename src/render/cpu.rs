use std::{collections::HashMap, sync::Arc};

use crate::{
    VitrineError, VitrineResult,
    assets::DecodedImage,
    foundation::core::Size,
    render::{FrameRGBA, RevealSurface},
    reveal::SpriteDraw,
};

/// CPU raster surface for the reveal canvas, backed by `vello_cpu`.
pub struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    images: HashMap<usize, vello_cpu::Image>,
}

impl CpuSurface {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            pixmap: vello_cpu::Pixmap::new(0, 0),
            images: HashMap::new(),
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }
}

impl Default for CpuSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RevealSurface for CpuSurface {
    fn insert_image(&mut self, index: usize, image: &DecodedImage) -> VitrineResult<()> {
        let pixmap =
            image_premul_bytes_to_pixmap(image.rgba8_premul.as_slice(), image.width, image.height)?;
        self.images.insert(
            index,
            vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
        );
        Ok(())
    }

    fn resize(&mut self, css_size: Size, pixel_ratio: f64) -> VitrineResult<()> {
        let width = backing_extent(css_size.width, pixel_ratio, "width")?;
        let height = backing_extent(css_size.height, pixel_ratio, "height")?;
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixmap = vello_cpu::Pixmap::new(width, height);
        } else {
            self.clear();
        }
        Ok(())
    }

    fn clear(&mut self) {
        clear_pixmap(&mut self.pixmap, [0, 0, 0, 0]);
    }

    fn draw(&mut self, pixel_ratio: f64, sprites: &[SpriteDraw]) -> VitrineResult<()> {
        self.clear();
        if sprites.is_empty() || self.width == 0 || self.height == 0 {
            return Ok(());
        }

        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        for sprite in sprites {
            let paint = self.images.get(&sprite.image).cloned().ok_or_else(|| {
                VitrineError::render(format!("reveal image {} was never inserted", sprite.image))
            })?;
            let (w, h) = image_paint_size(&paint)?;
            let r = sprite.rect;
            // Image space -> sprite rect (CSS px) -> backing store px.
            let transform = vello_cpu::kurbo::Affine::scale(pixel_ratio)
                * vello_cpu::kurbo::Affine::translate((r.x0, r.y0))
                * vello_cpu::kurbo::Affine::scale_non_uniform(r.width() / w, r.height() / h);

            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(transform);
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        Ok(())
    }

    fn readback_rgba8(&self) -> FrameRGBA {
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

fn backing_extent(css: f64, pixel_ratio: f64, axis: &str) -> VitrineResult<u16> {
    let px = (css * pixel_ratio).floor();
    if !px.is_finite() || px < 0.0 || px > f64::from(u16::MAX) {
        return Err(VitrineError::render(format!(
            "canvas {axis} {px} does not fit a u16 surface"
        )));
    }
    Ok(px as u16)
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> VitrineResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| VitrineError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| VitrineError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(VitrineError::render("decoded image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn image_paint_size(image: &vello_cpu::Image) -> VitrineResult<(f64, f64)> {
    match &image.image {
        vello_cpu::ImageSource::Pixmap(p) => Ok((f64::from(p.width()), f64::from(p.height()))),
        vello_cpu::ImageSource::OpaqueId(_) => Err(VitrineError::render(
            "cpu surface does not support opaque image ids",
        )),
    }
}
