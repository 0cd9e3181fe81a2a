pub mod cpu;

use crate::{
    VitrineResult,
    assets::DecodedImage,
    foundation::core::Size,
    reveal::{CanvasCommand, SpriteDraw},
};

pub use cpu::CpuSurface;

#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// A raster target for one reveal canvas.
pub trait RevealSurface {
    /// Register the decoded image for pool index `index`.
    fn insert_image(&mut self, index: usize, image: &DecodedImage) -> VitrineResult<()>;

    fn resize(&mut self, css_size: Size, pixel_ratio: f64) -> VitrineResult<()>;

    fn clear(&mut self);

    /// Clear, then draw the sprites in order.
    fn draw(&mut self, pixel_ratio: f64, sprites: &[SpriteDraw]) -> VitrineResult<()>;

    fn readback_rgba8(&self) -> FrameRGBA;

    fn apply(&mut self, cmd: &CanvasCommand) -> VitrineResult<()> {
        match cmd {
            CanvasCommand::Resize {
                css_size,
                pixel_ratio,
                ..
            } => self.resize(*css_size, *pixel_ratio),
            CanvasCommand::Clear { .. } => {
                self.clear();
                Ok(())
            }
            CanvasCommand::Draw {
                pixel_ratio,
                sprites,
                ..
            } => self.draw(*pixel_ratio, sprites),
        }
    }
}
