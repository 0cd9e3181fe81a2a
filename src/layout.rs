use std::collections::HashMap;

use crate::foundation::core::{ElementId, Rect, Size, Viewport};

/// Read-only layout queries the components need from their host.
pub trait LayoutProbe {
    /// `innerWidth` × `innerHeight`.
    fn viewport(&self) -> Viewport;

    /// Document client width (viewport minus any vertical scrollbar).
    fn client_width(&self) -> f64 {
        self.viewport().width
    }

    fn scroll_y(&self) -> f64;

    /// Bounding rect relative to the viewport.
    fn client_rect(&self, id: ElementId) -> Option<Rect>;

    /// Distance from the document top.
    fn offset_top(&self, id: ElementId) -> Option<f64>;

    /// Client width minus horizontal padding.
    fn content_width(&self, id: ElementId) -> Option<f64>;

    /// Rendered size with every engine override removed.
    fn rest_size(&self, id: ElementId) -> Option<Size>;

    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    /// Touch-first device (`pointer: coarse`).
    fn coarse_pointer(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementBox {
    pub id: ElementId,
    /// Document-space rect.
    pub rect: Rect,
    #[serde(default)]
    pub content_width: Option<f64>,
    #[serde(default)]
    pub rest_size: Option<Size>,
}

fn default_dpr() -> f64 {
    1.0
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct StaticLayoutRepr {
    viewport: Viewport,
    #[serde(default)]
    client_width: Option<f64>,
    #[serde(default)]
    scroll_y: f64,
    #[serde(default)]
    elements: Vec<ElementBox>,
    #[serde(default = "default_dpr")]
    device_pixel_ratio: f64,
    #[serde(default)]
    coarse_pointer: bool,
}

/// Fixed document layout for headless hosts: element rects in document space
/// plus a movable scroll position.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(from = "StaticLayoutRepr", into = "StaticLayoutRepr")]
pub struct StaticLayout {
    pub viewport: Viewport,
    pub client_width: Option<f64>,
    pub scroll_y: f64,
    pub device_pixel_ratio: f64,
    pub coarse_pointer: bool,
    boxes: HashMap<ElementId, ElementBox>,
}

impl From<StaticLayoutRepr> for StaticLayout {
    fn from(r: StaticLayoutRepr) -> Self {
        Self {
            viewport: r.viewport,
            client_width: r.client_width,
            scroll_y: r.scroll_y,
            device_pixel_ratio: r.device_pixel_ratio,
            coarse_pointer: r.coarse_pointer,
            boxes: r.elements.into_iter().map(|b| (b.id, b)).collect(),
        }
    }
}

impl From<StaticLayout> for StaticLayoutRepr {
    fn from(l: StaticLayout) -> Self {
        let mut elements: Vec<ElementBox> = l.boxes.into_values().collect();
        elements.sort_by_key(|b| b.id);
        Self {
            viewport: l.viewport,
            client_width: l.client_width,
            scroll_y: l.scroll_y,
            elements,
            device_pixel_ratio: l.device_pixel_ratio,
            coarse_pointer: l.coarse_pointer,
        }
    }
}

impl StaticLayout {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            client_width: None,
            scroll_y: 0.0,
            device_pixel_ratio: 1.0,
            coarse_pointer: false,
            boxes: HashMap::new(),
        }
    }

    pub fn with_box(mut self, id: ElementId, rect: Rect) -> Self {
        self.insert(ElementBox {
            id,
            rect,
            content_width: None,
            rest_size: None,
        });
        self
    }

    pub fn insert(&mut self, b: ElementBox) {
        self.boxes.insert(b.id, b);
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut ElementBox> {
        self.boxes.get_mut(&id)
    }
}

impl LayoutProbe for StaticLayout {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn client_width(&self) -> f64 {
        self.client_width.unwrap_or(self.viewport.width)
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn client_rect(&self, id: ElementId) -> Option<Rect> {
        let r = self.boxes.get(&id)?.rect;
        Some(Rect::new(r.x0, r.y0 - self.scroll_y, r.x1, r.y1 - self.scroll_y))
    }

    fn offset_top(&self, id: ElementId) -> Option<f64> {
        Some(self.boxes.get(&id)?.rect.y0)
    }

    fn content_width(&self, id: ElementId) -> Option<f64> {
        let b = self.boxes.get(&id)?;
        Some(b.content_width.unwrap_or(b.rect.width()))
    }

    fn rest_size(&self, id: ElementId) -> Option<Size> {
        let b = self.boxes.get(&id)?;
        Some(b.rest_size.unwrap_or(b.rect.size()))
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn coarse_pointer(&self) -> bool {
        self.coarse_pointer
    }
}
