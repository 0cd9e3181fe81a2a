use std::collections::BTreeSet;

use crate::foundation::core::ElementId;

/// Elements believed stuck: a `stalled`/`error` fired with no `playing` since.
#[derive(Clone, Debug, Default)]
pub struct StalledSet {
    ids: BTreeSet<ElementId>,
}

impl StalledSet {
    pub fn insert(&mut self, id: ElementId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: ElementId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Owned copy for iteration; the set may be mutated while walking it.
    pub fn snapshot(&self) -> Vec<ElementId> {
        self.ids.iter().copied().collect()
    }
}

/// Fixed-period schedule for the recovery sweep.
#[derive(Clone, Copy, Debug)]
pub struct StallMonitor {
    interval_ms: f64,
    next_due: Option<f64>,
}

impl StallMonitor {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            next_due: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// `true` once per elapsed period. The first call only starts the schedule.
    pub fn due(&mut self, now_ms: f64) -> bool {
        match self.next_due {
            None => {
                self.next_due = Some(now_ms + self.interval_ms);
                false
            }
            Some(at) if now_ms >= at => {
                // Missed periods collapse into this one.
                self.next_due = Some(now_ms + self.interval_ms);
                true
            }
            Some(_) => false,
        }
    }
}
