use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::{VitrineResult, assets::DecodedImage, reveal::ImagePool};

pub fn decode_image(bytes: &[u8]) -> VitrineResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Read every pool image relative to `root`, marking each loaded or failed.
///
/// Returns the decoded images by pool index. A missing or corrupt file only
/// fails that image.
pub fn load_pool(pool: &mut ImagePool, root: &Path) -> Vec<(usize, DecodedImage)> {
    let urls: Vec<String> = pool.urls().map(str::to_string).collect();
    let mut decoded = Vec::new();
    for (index, url) in urls.iter().enumerate() {
        let path = root.join(url);
        let result = std::fs::read(&path)
            .with_context(|| format!("read reveal image '{}'", path.display()))
            .map_err(Into::into)
            .and_then(|bytes| decode_image(&bytes));
        match result {
            Ok(img) => {
                pool.mark_loaded(index, img.width, img.height);
                decoded.push((index, img));
            }
            Err(err) => {
                tracing::warn!(%err, "skipping reveal image");
                pool.mark_failed(index);
            }
        }
    }
    decoded
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}
