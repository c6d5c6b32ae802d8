use crate::hit::{SharedHit, push_unique};
use faint_particle_common::Ticks;

/// Collects the hits of consecutive passing windows into one candidate trigger.
#[derive(Default, Debug, Clone)]
pub struct TriggerAccumulator {
    hits: Vec<SharedHit>,
    /// End of the last window merged in.
    window_end: Ticks,
}

impl TriggerAccumulator {
    /// A trigger is forming while any hits are held.
    pub fn is_forming(&self) -> bool {
        !self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn hits(&self) -> &[SharedHit] {
        &self.hits
    }

    pub fn window_end(&self) -> Ticks {
        self.window_end
    }

    /// Starts a new trigger from a copy of a window's hits.
    pub(crate) fn seed(&mut self, hits: &[SharedHit], window_end: Ticks) {
        self.hits = hits.to_vec();
        self.window_end = window_end;
    }

    /// Extends the forming trigger with the window hits it does not hold yet.
    pub(crate) fn merge(&mut self, hits: &[SharedHit], window_end: Ticks) {
        for hit in hits {
            push_unique(&mut self.hits, hit);
        }
        self.window_end = window_end;
    }

    /// Time between the first and last hit held, in ticks.
    pub fn span(&self) -> Ticks {
        match (self.hits.first(), self.hits.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0,
        }
    }

    /// True if a trigger is forming and the window starting at `start` lies
    /// entirely beyond the last window merged into it.
    pub fn is_behind(&self, start: Ticks) -> bool {
        self.is_forming() && self.window_end < start
    }

    /// Removes and returns the held hits.
    pub(crate) fn take(&mut self) -> Vec<SharedHit> {
        std::mem::take(&mut self.hits)
    }

    pub(crate) fn clear(&mut self) {
        self.hits.clear();
    }
}
