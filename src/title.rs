use crate::{
    config::TitleConfig,
    dom::{ClassName, DomPatch},
    foundation::core::ElementId,
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TitlePhase {
    Idle,
    FirstIn,
    Hold { until_ms: f64 },
    FirstOut,
    SecondIn,
    Done,
}

/// Two stacked titles: the first fades in, holds, fades out, then the second
/// fades in and stays.
#[derive(Debug)]
pub struct TitleSequence {
    first: ElementId,
    second: Option<ElementId>,
    phase: TitlePhase,
    hold_ms: f64,
}

impl TitleSequence {
    /// `None` without at least one title element.
    pub fn new(titles: &[ElementId], cfg: &TitleConfig) -> Option<Self> {
        let (&first, rest) = titles.split_first()?;
        Some(Self {
            first,
            second: rest.first().copied(),
            phase: TitlePhase::Idle,
            hold_ms: cfg.hold_ms,
        })
    }

    pub fn phase(&self) -> TitlePhase {
        self.phase
    }

    /// Next instant [`tick`](Self::tick) needs to run at, if any.
    pub fn deadline(&self) -> Option<f64> {
        match self.phase {
            TitlePhase::Hold { until_ms } => Some(until_ms),
            _ => None,
        }
    }

    /// Start the sequence. Later calls do nothing.
    pub fn start(&mut self) -> Vec<DomPatch> {
        if self.phase != TitlePhase::Idle {
            return Vec::new();
        }
        self.phase = TitlePhase::FirstIn;
        tracing::debug!("title sequence started");
        vec![DomPatch::class(self.first, ClassName::Visible, true)]
    }

    /// Only `opacity` transitions on the title elements advance the sequence.
    pub fn on_transition_end(
        &mut self,
        target: ElementId,
        property: &str,
        now_ms: f64,
    ) -> Vec<DomPatch> {
        if property != "opacity" {
            return Vec::new();
        }
        match self.phase {
            TitlePhase::FirstIn if target == self.first => {
                self.phase = TitlePhase::Hold {
                    until_ms: now_ms + self.hold_ms,
                };
                Vec::new()
            }
            TitlePhase::FirstOut if target == self.first => match self.second {
                Some(second) => {
                    self.phase = TitlePhase::SecondIn;
                    vec![DomPatch::class(second, ClassName::Visible, true)]
                }
                None => {
                    self.phase = TitlePhase::Done;
                    Vec::new()
                }
            },
            TitlePhase::SecondIn if Some(target) == self.second => {
                self.phase = TitlePhase::Done;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn tick(&mut self, now_ms: f64) -> Vec<DomPatch> {
        match self.phase {
            TitlePhase::Hold { until_ms } if now_ms >= until_ms => {
                self.phase = TitlePhase::FirstOut;
                vec![DomPatch::class(self.first, ClassName::Visible, false)]
            }
            _ => Vec::new(),
        }
    }
}
