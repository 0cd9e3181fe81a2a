use std::collections::BTreeSet;

use crate::{
    foundation::{
        core::ElementId,
        error::{VitrineError, VitrineResult},
    },
    media::SourcePair,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoDesc {
    pub id: ElementId,
    pub sources: SourcePair,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HeroDesc {
    pub id: ElementId,
    /// Nested media wrapper whose size is pinned during the bleed.
    #[serde(default)]
    pub graphic: Option<ElementId>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RevealZoneDesc {
    pub id: ElementId,
    pub canvas: ElementId,
    /// Image `i` (1-based) lives at `prefix + i + ".webp"`.
    pub prefix: String,
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NavDesc {
    pub root: ElementId,
    pub links: ElementId,
    pub card: ElementId,
    #[serde(default)]
    pub sides: Vec<ElementId>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SectionDesc {
    pub id: ElementId,
    /// DOM id, used as the URL fragment.
    pub anchor: String,
}

/// Every element the engine touches, resolved once at startup.
///
/// Components read their handles from here and never look elements up again.
/// A missing optional entry disables the component that needs it.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Registry {
    pub videos: Vec<VideoDesc>,
    pub content_wrap: Option<ElementId>,
    pub heroes: Vec<HeroDesc>,
    pub reveal_zones: Vec<RevealZoneDesc>,
    pub nav: Option<NavDesc>,
    pub first_section: Option<ElementId>,
    pub end_section: Option<ElementId>,
    pub nav_links: Vec<ElementId>,
    /// Anchors the nav links point at, by link index.
    pub link_targets: Vec<String>,
    pub sections: Vec<SectionDesc>,
    pub scroll_reveals: Vec<ElementId>,
    pub titles: Vec<ElementId>,
    pub snap_header: Option<ElementId>,
}

impl Registry {
    pub fn from_json_str(s: &str) -> VitrineResult<Self> {
        let registry: Self = serde_json::from_str(s)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Reject handles registered under two roles that would both mutate them.
    pub fn validate(&self) -> VitrineResult<()> {
        let mut seen = BTreeSet::new();
        let owned = self
            .videos
            .iter()
            .map(|v| v.id)
            .chain(self.heroes.iter().map(|h| h.id))
            .chain(self.heroes.iter().filter_map(|h| h.graphic))
            .chain(self.reveal_zones.iter().flat_map(|z| [z.id, z.canvas]))
            .chain(self.nav_links.iter().copied());
        for id in owned {
            if !seen.insert(id) {
                return Err(VitrineError::validation(format!(
                    "element {} is registered twice",
                    id.0
                )));
            }
        }

        for v in &self.videos {
            if v.sources.is_empty() {
                return Err(VitrineError::validation(format!(
                    "video {} has neither a webm nor an mp4 source",
                    v.id.0
                )));
            }
        }
        for s in &self.sections {
            if s.anchor.trim().is_empty() {
                return Err(VitrineError::validation("section anchor must be non-empty"));
            }
        }
        Ok(())
    }

    pub fn section_anchor(&self, id: ElementId) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.anchor.as_str())
    }
}

/// Hands out fresh handles while a host walks its element tree.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn alloc(&mut self) -> ElementId {
        let id = ElementId(self.next);
        self.next += 1;
        id
    }
}
