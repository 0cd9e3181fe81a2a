//! Viewport intersection tracking.
//!
//! Hosts with a native intersection observer (browsers) report entries
//! directly. Headless hosts drive an [`IntersectionTracker`] from element rects
//! instead; both paths produce the same [`IntersectionEntry`] stream.

use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::foundation::core::{ElementId, Rect, Viewport};

/// One margin component: absolute pixels or a percentage of the viewport axis.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MarginLen {
    Px(f64),
    Percent(f64),
}

impl MarginLen {
    fn resolve(self, axis: f64) -> f64 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => axis * p / 100.0,
        }
    }
}

impl fmt::Display for MarginLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

impl FromStr for MarginLen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (num, ctor): (&str, fn(f64) -> MarginLen) = if let Some(n) = s.strip_suffix('%') {
            (n, MarginLen::Percent)
        } else if let Some(n) = s.strip_suffix("px") {
            (n, MarginLen::Px)
        } else if s == "0" {
            (s, MarginLen::Px)
        } else {
            return Err(format!("margin component '{s}' must end in 'px' or '%'"));
        };
        let v: f64 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid margin number '{num}'"))?;
        if !v.is_finite() {
            return Err(format!("margin component '{s}' must be finite"));
        }
        Ok(ctor(v))
    }
}

/// Root margin in CSS shorthand order (top, right, bottom, left).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RootMargin {
    pub top: MarginLen,
    pub right: MarginLen,
    pub bottom: MarginLen,
    pub left: MarginLen,
}

impl Default for RootMargin {
    fn default() -> Self {
        let zero = MarginLen::Px(0.0);
        Self {
            top: zero,
            right: zero,
            bottom: zero,
            left: zero,
        }
    }
}

impl RootMargin {
    /// The viewport rect grown (or shrunk, for negative components) by this margin.
    /// Vertical percentages resolve against the height, horizontal ones against the width.
    pub fn expand(&self, viewport: Viewport) -> Rect {
        Rect::new(
            -self.left.resolve(viewport.width),
            -self.top.resolve(viewport.height),
            viewport.width + self.right.resolve(viewport.width),
            viewport.height + self.bottom.resolve(viewport.height),
        )
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

impl FromStr for RootMargin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split_whitespace()
            .map(str::parse::<MarginLen>)
            .collect::<Result<Vec<_>, _>>()?;
        let [top, right, bottom, left] = match parts.as_slice() {
            [a] => [*a, *a, *a, *a],
            [v, h] => [*v, *h, *v, *h],
            [t, h, b] => [*t, *h, *b, *h],
            [t, r, b, l] => [*t, *r, *b, *l],
            _ => return Err(format!("root margin '{s}' must have 1 to 4 components")),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IntersectionEntry {
    pub target: ElementId,
    /// The element reaches the tracker's lowest threshold.
    pub is_intersecting: bool,
    /// Visible fraction of the element's area inside the margin-expanded root.
    pub ratio: f64,
}

/// Fraction of `target` covered by `root`, and whether the two touch at all.
pub fn intersection_ratio(target: Rect, root: Rect) -> (bool, f64) {
    let x0 = target.x0.max(root.x0);
    let y0 = target.y0.max(root.y0);
    let x1 = target.x1.min(root.x1);
    let y1 = target.y1.min(root.y1);
    if x1 < x0 || y1 < y0 {
        return (false, 0.0);
    }
    let area = target.area();
    if area <= 0.0 {
        return (true, 1.0);
    }
    (true, ((x1 - x0) * (y1 - y0) / area).clamp(0.0, 1.0))
}

#[derive(Clone, Copy, Debug)]
struct Observed {
    once: bool,
    last: Option<(bool, usize)>,
}

/// Emits an entry for each observed element on its first evaluation and then
/// only when it crosses one of the thresholds.
#[derive(Clone, Debug)]
pub struct IntersectionTracker {
    margin: RootMargin,
    thresholds: Vec<f64>,
    targets: BTreeMap<ElementId, Observed>,
}

impl IntersectionTracker {
    pub fn new(margin: RootMargin, thresholds: &[f64]) -> Self {
        let mut thresholds: Vec<f64> = thresholds
            .iter()
            .copied()
            .filter(|t| t.is_finite())
            .map(|t| t.clamp(0.0, 1.0))
            .collect();
        if thresholds.is_empty() {
            thresholds.push(0.0);
        }
        thresholds.sort_by(f64::total_cmp);
        thresholds.dedup();
        Self {
            margin,
            thresholds,
            targets: BTreeMap::new(),
        }
    }

    pub fn margin(&self) -> RootMargin {
        self.margin
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Start observing `id`. A `once` target stops being observed after its
    /// first intersecting entry.
    pub fn observe(&mut self, id: ElementId, once: bool) {
        self.targets.insert(id, Observed { once, last: None });
    }

    pub fn unobserve(&mut self, id: ElementId) {
        self.targets.remove(&id);
    }

    pub fn is_observing(&self, id: ElementId) -> bool {
        self.targets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Evaluate every observed element against the current viewport.
    /// Elements for which `rect_of` returns `None` (detached) are skipped.
    pub fn update(
        &mut self,
        viewport: Viewport,
        mut rect_of: impl FnMut(ElementId) -> Option<Rect>,
    ) -> Vec<IntersectionEntry> {
        let root = self.margin.expand(viewport);
        let mut out = Vec::new();
        let mut finished = Vec::new();

        for (&id, observed) in &mut self.targets {
            let Some(rect) = rect_of(id) else {
                continue;
            };
            let (touching, ratio) = intersection_ratio(rect, root);
            let crossed = if touching {
                self.thresholds.iter().filter(|&&t| ratio >= t).count()
            } else {
                0
            };
            let is_intersecting = crossed > 0;
            let state = (is_intersecting, crossed);
            if observed.last == Some(state) {
                continue;
            }
            observed.last = Some(state);
            out.push(IntersectionEntry {
                target: id,
                is_intersecting,
                ratio,
            });
            if observed.once && is_intersecting {
                finished.push(id);
            }
        }

        for id in finished {
            self.targets.remove(&id);
        }
        out
    }
}

#[cfg(test)]
#[path = "../tests/unit/observe.rs"]
mod tests;
