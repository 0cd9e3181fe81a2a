/// Load state of one pool image.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ImageState {
    Pending,
    Ready { width: u32, height: u32 },
    Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PoolImage {
    pub url: String,
    pub state: ImageState,
}

/// An image that finished loading, by its pool index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReadyImage {
    pub index: usize,
    pub width: u32,
    pub height: u32,
}

impl ReadyImage {
    /// Height over width; zero-width images report a square.
    pub fn aspect(&self) -> f64 {
        if self.width == 0 {
            return 1.0;
        }
        f64::from(self.height) / f64::from(self.width)
    }
}

/// Reveal images `prefix1.webp ..= prefixN.webp`, loaded independently.
#[derive(Clone, Debug, Default)]
pub struct ImagePool {
    images: Vec<PoolImage>,
}

impl ImagePool {
    pub fn new(prefix: &str, count: u32) -> Self {
        let images = (1..=count)
            .map(|i| PoolImage {
                url: format!("{prefix}{i}.webp"),
                state: ImageState::Pending,
            })
            .collect();
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[PoolImage] {
        &self.images
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|i| i.url.as_str())
    }

    /// Zero-sized images never become usable and are recorded as failed.
    pub fn mark_loaded(&mut self, index: usize, width: u32, height: u32) {
        let Some(img) = self.images.get_mut(index) else {
            return;
        };
        img.state = if width == 0 || height == 0 {
            ImageState::Failed
        } else {
            ImageState::Ready { width, height }
        };
    }

    pub fn mark_failed(&mut self, index: usize) {
        if let Some(img) = self.images.get_mut(index) {
            tracing::debug!(url = %img.url, "reveal image failed to load");
            img.state = ImageState::Failed;
        }
    }

    /// Loaded images in pool order.
    pub fn ready(&self) -> Vec<ReadyImage> {
        self.images
            .iter()
            .enumerate()
            .filter_map(|(index, img)| match img.state {
                ImageState::Ready { width, height } => Some(ReadyImage {
                    index,
                    width,
                    height,
                }),
                _ => None,
            })
            .collect()
    }
}
