//! The sliding time window.
//!
//! A window covers the half open span `[start, start + duration)`. Its origin
//! is fixed by the first hit it ever receives and from then on only moves
//! forward, in whole steps of the configured separation.
use crate::hit::{SharedHit, push_unique};
use faint_particle_common::Ticks;
use std::{fmt::Display, ops::RangeInclusive};

#[derive(Debug, Clone)]
pub struct SlidingWindow {
    origin: Option<Ticks>,
    duration: Ticks,
    separation: Ticks,
    hits: Vec<SharedHit>,
}

impl SlidingWindow {
    pub fn new(duration: Ticks, separation: Ticks) -> Self {
        Self {
            origin: None,
            duration,
            separation,
            hits: Vec::new(),
        }
    }

    /// Sets the origin to `time` unless the window already has one.
    pub(crate) fn anchor(&mut self, time: Ticks) {
        self.origin.get_or_insert(time);
    }

    pub fn start(&self) -> Option<Ticks> {
        self.origin
    }

    /// `None` if the window has no origin, or would end beyond the range of [Ticks].
    pub fn end(&self) -> Option<Ticks> {
        self.origin.and_then(|start| start.checked_add(self.duration))
    }

    pub fn contains_time(&self, time: Ticks) -> bool {
        self.origin
            .zip(self.end())
            .is_some_and(|(start, end)| start <= time && time < end)
    }

    /// True if the window closes at or before `time`.
    pub(crate) fn ends_before(&self, time: Ticks) -> bool {
        self.end().is_some_and(|end| end <= time)
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn hits(&self) -> &[SharedHit] {
        &self.hits
    }

    /// Appends `hit` unless it is already buffered. Returns `true` if appended.
    pub(crate) fn insert(&mut self, hit: &SharedHit) -> bool {
        push_unique(&mut self.hits, hit)
    }

    /// Steps the origin forward once and drops the hits that fall before it.
    /// Returns `true` if this removed the last buffered hit.
    pub(crate) fn advance(&mut self) -> bool {
        let Some(start) = self.origin.as_mut() else {
            return false;
        };
        *start = start.saturating_add(self.separation);
        let start = *start;

        let was_empty = self.hits.is_empty();
        let expired = self.hits.partition_point(|hit| hit.time < start);
        self.hits.drain(..expired);
        !was_empty && self.hits.is_empty()
    }

    /// Steps an empty window forward by as many separations as it takes for
    /// `time` to fall before its end.
    pub(crate) fn skip_to(&mut self, time: Ticks) {
        let (Some(start), Some(end)) = (self.origin, self.end()) else {
            return;
        };
        if end > time || self.separation <= 0 {
            return;
        }
        // The gap may exceed the range of Ticks. The new origin never passes `time`.
        let separation = i128::from(self.separation);
        let steps = (i128::from(time) - i128::from(end)) / separation + 1;
        if let Ok(start) = Ticks::try_from(i128::from(start) + steps * separation) {
            self.origin = Some(start);
        }
    }

    pub fn has_hit_count_in(&self, range: &RangeInclusive<usize>) -> bool {
        range.contains(&self.hits.len())
    }

    /// The fraction of buffered hits that are low-gain, or `None` if the window is empty.
    pub fn low_gain_fraction(&self) -> Option<f64> {
        if self.hits.is_empty() {
            return None;
        }
        let low_gain = self.hits.iter().filter(|hit| hit.low_gain).count();
        Some(low_gain as f64 / self.hits.len() as f64)
    }

    /// Empties the buffer and forgets the origin.
    pub(crate) fn clear(&mut self) {
        self.hits.clear();
        self.origin = None;
    }
}

impl Display for SlidingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Spans from the earliest buffered hit for one window duration.
        match self.hits.first() {
            Some(first) => write!(
                f,
                "Window*{}[{}-{}]",
                self.hits.len(),
                first.time,
                first.time.saturating_add(self.duration)
            ),
            None => write!(f, "Window[]"),
        }
    }
}
