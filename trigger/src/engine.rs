//! The faint particle trigger algorithm.
//!
//! Hits are fed one at a time, in time order, through [FaintParticleTrigger::process].
//! Each usable hit first drives the sliding window forward until the hit
//! falls inside it, classifying every non-empty window left behind, and is
//! then buffered. Consecutive passing windows are merged into one candidate
//! trigger, which is emitted to the [TriggerSink] once the window moves past
//! it, or as soon as it grows longer than the maximum trigger length.
use crate::{
    accumulator::TriggerAccumulator,
    classifier::{Verdict, WindowClassifier},
    config::TriggerConfig,
    error::{TriggerError, TriggerResult},
    hit::{HitKind, SharedHit},
    services::{CandidateTrigger, Geometry, HitClassifier, TriggerSink},
    window::SlidingWindow,
};
use faint_particle_common::{
    Ticks,
    metrics::{
        names::{
            HITS_RECEIVED, HITS_REJECTED, OVERLONG_TRIGGERS, TRIGGERS_EMITTED,
            WINDOW_CUT_FAILURES, WINDOWS_CLASSIFIED,
        },
        window_cuts,
    },
};
use metrics::counter;
use tracing::{debug, error, info, trace, warn};

/// Trigger type number reported with every trigger.
pub const TRIGGER_TYPE: i32 = 33;
pub const MONITORING_NAME: &str = "FAINT_PARTICLE";
pub const DEFAULT_TRIGGER_NAME: &str = "FaintParticleTrigger";

pub struct FaintParticleTrigger<G, C, S> {
    name: String,
    config: TriggerConfig,
    geometry: G,
    classifier: C,
    sink: S,
    window: SlidingWindow,
    accumulator: TriggerAccumulator,
    last_hit_time: Option<Ticks>,
    triggers_emitted: u64,
}

impl<G, C, S> FaintParticleTrigger<G, C, S>
where
    G: Geometry,
    C: HitClassifier,
    S: TriggerSink,
{
    pub fn new(config: TriggerConfig, geometry: G, classifier: C, sink: S) -> Self {
        let window = SlidingWindow::new(config.window_duration(), config.window_separation());
        Self {
            name: DEFAULT_TRIGGER_NAME.to_owned(),
            config,
            geometry,
            classifier,
            sink,
            window,
            accumulator: TriggerAccumulator::default(),
            last_hit_time: None,
            triggers_emitted: 0,
        }
    }

    pub fn set_trigger_name(&mut self, name: &str) {
        self.name = name.to_owned();
        info!("TriggerName set to {}", self.name);
    }

    pub fn trigger_name(&self) -> &str {
        &self.name
    }

    pub fn trigger_type(&self) -> i32 {
        TRIGGER_TYPE
    }

    pub fn monitoring_name(&self) -> &'static str {
        MONITORING_NAME
    }

    /// This algorithm does not compute a trigger multiplicity.
    pub fn has_valid_multiplicity(&self) -> bool {
        false
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    /// Number of hits currently buffered in the sliding window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn is_trigger_forming(&self) -> bool {
        self.accumulator.is_forming()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Feeds one hit to the trigger.
    ///
    /// Hits which the classifier rejects, or which are not single pulse hits,
    /// are dropped after the ordering check.
    ///
    /// # Error Modes
    /// - [TriggerError::OutOfOrder] if `hit` is earlier than the previous hit.
    ///   The hit is discarded and the trigger state is unchanged.
    /// - [TriggerError::TimeOutOfRange] if no window containing `hit` could
    ///   end within the range of [Ticks]. The hit is discarded and the
    ///   trigger state is unchanged.
    #[tracing::instrument(skip_all, level = "trace", err(level = "warn"), fields(
        time = hit.time,
        sensor = hit.sensor,
    ))]
    pub fn process(&mut self, hit: SharedHit) -> TriggerResult<()> {
        counter!(HITS_RECEIVED).increment(1);

        if let Some(previous) = self.last_hit_time.filter(|&previous| hit.time < previous) {
            return Err(TriggerError::OutOfOrder {
                previous,
                current: hit.time,
                sensor: hit.sensor,
            });
        }
        let duration = self.config.window_duration();
        if hit.time.checked_add(duration).is_none() {
            return Err(TriggerError::TimeOutOfRange {
                time: hit.time,
                duration,
                sensor: hit.sensor,
            });
        }
        self.last_hit_time = Some(hit.time);

        if !self.classifier.is_usable(&hit)
            || self.classifier.hit_kind(&hit) != HitKind::SinglePulse
        {
            debug!("Hit {hit:?} isn't usable");
            counter!(HITS_REJECTED).increment(1);
            return Ok(());
        }
        self.analyze_window(hit);
        Ok(())
    }

    fn analyze_window(&mut self, hit: SharedHit) {
        self.window.anchor(hit.time);
        self.update_sliding_window(hit.time);
        self.window.insert(&hit);
    }

    /// Moves the window forward until it contains `time`.
    fn update_sliding_window(&mut self, time: Ticks) {
        while self.window.ends_before(time) {
            if self.window.is_empty() {
                // Nothing to classify, and no window in between can extend the trigger.
                self.window.skip_to(time);
                self.flush_pending();
                continue;
            }

            self.classify_window();
            if self.window.advance() {
                self.flush_pending();
            }
        }
    }

    fn classify_window(&mut self) {
        self.flush_pending();

        counter!(WINDOWS_CLASSIFIED).increment(1);
        let verdict = WindowClassifier::new(&self.config, &self.geometry).classify(&self.window);
        match verdict {
            Verdict::Pass => {
                debug!("{} passed", self.window);
                self.accept_window();
            }
            Verdict::Fail(cut) => {
                trace!("{} failed the {cut:?} cut", self.window);
                counter!(WINDOW_CUT_FAILURES, &[window_cuts::get_label(cut)]).increment(1);
            }
        }
    }

    fn accept_window(&mut self) {
        let Some(window_end) = self.window.end() else {
            error!("{} passed but has no end, dropping it", self.window);
            return;
        };

        if self.accumulator.is_forming() {
            self.accumulator.merge(self.window.hits(), window_end);

            let length = self.accumulator.span();
            if length as f64 > self.config.max_trigger_length() {
                warn!(
                    "Unexpected long event: {} hits over {length} ticks",
                    self.accumulator.len()
                );
                counter!(OVERLONG_TRIGGERS).increment(1);
                self.flush_trigger();
            }
        } else {
            self.accumulator.seed(self.window.hits(), window_end);
        }
    }

    fn flush_trigger(&mut self) {
        let trigger = CandidateTrigger {
            number: self.triggers_emitted,
            hits: self.accumulator.take(),
        };
        info!(
            "{} trigger #{}: {} hits from {:?} to {:?}",
            self.name,
            trigger.number,
            trigger.len(),
            trigger.first_time(),
            trigger.last_time()
        );
        self.triggers_emitted += 1;
        counter!(TRIGGERS_EMITTED).increment(1);
        self.sink.emit(trigger);
    }

    /// Emits the forming trigger if the window has moved entirely past it.
    pub fn flush_pending(&mut self) {
        if self
            .window
            .start()
            .is_some_and(|start| self.accumulator.is_behind(start))
        {
            self.flush_trigger();
        }
    }

    /// Closes the run: classifies whatever the window still holds, emits any
    /// forming trigger, and resets.
    pub fn finish_run(&mut self) {
        if !self.window.is_empty() {
            self.classify_window();
        }
        if self.accumulator.is_forming() {
            self.flush_trigger();
        }
        self.reset();
    }

    /// Discards the window, any forming trigger and the ordering state, without emitting.
    pub fn reset(&mut self) {
        if self.accumulator.is_forming() {
            debug!("Discarding forming trigger of {} hits", self.accumulator.len());
        }
        self.window.clear();
        self.accumulator.clear();
        self.last_hit_time = None;
    }
}
