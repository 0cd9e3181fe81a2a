//! Scripted headless runs: a page manifest plus a list of steps replayed
//! through [`Page`] against a [`StaticLayout`].

use std::path::Path;

use anyhow::Context as _;

use crate::{
    config::EngineConfig,
    foundation::{core::Viewport, error::VitrineResult},
    layout::StaticLayout,
    page::{Effects, Page, PageEvent},
    registry::Registry,
};

/// Everything needed to stand up a page without a browser.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PageManifest {
    pub registry: Registry,
    #[serde(default)]
    pub config: EngineConfig,
    pub layout: StaticLayout,
    #[serde(default)]
    pub initial_hash: Option<String>,
}

/// One scripted step.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Move the document scroll position.
    ScrollTo { y: f64 },
    SetViewport { width: f64, height: f64 },
    /// Evaluate every observer against the current layout.
    Observe,
    Event { event: PageEvent },
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Script {
    #[serde(flatten)]
    pub manifest: PageManifest,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Effects produced by one step, tagged with its position in the script.
/// Index `None` is the page's initial state.
#[derive(Clone, Debug, serde::Serialize)]
pub struct StepOutput {
    pub step: Option<usize>,
    pub effects: Effects,
}

impl Script {
    pub fn from_json_str(s: &str) -> VitrineResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: &Path) -> VitrineResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read script '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Replay every step. Steps that produce no effects are omitted.
    pub fn run(&self) -> VitrineResult<Vec<StepOutput>> {
        let manifest = &self.manifest;
        let mut layout = manifest.layout.clone();
        let (mut page, init) = Page::new(
            &manifest.registry,
            &manifest.config,
            manifest.initial_hash.as_deref(),
            &layout,
        )?;

        let mut out = vec![StepOutput {
            step: None,
            effects: init,
        }];
        for (i, step) in self.steps.iter().enumerate() {
            let effects = match step {
                Step::ScrollTo { y } => {
                    layout.scroll_y = *y;
                    continue;
                }
                Step::SetViewport { width, height } => {
                    layout.viewport = Viewport::new(*width, *height)?;
                    continue;
                }
                Step::Observe => page.drive_intersections(&layout),
                Step::Event { event } => page.handle(event.clone(), &layout),
            };
            if !effects.is_empty() {
                out.push(StepOutput {
                    step: Some(i),
                    effects,
                });
            }
        }
        tracing::debug!(steps = self.steps.len(), outputs = out.len(), "script finished");
        Ok(out)
    }
}
