pub mod decode;

use std::sync::Arc;

/// A decoded reveal image ready for a raster surface.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

pub use decode::{decode_image, load_pool};
