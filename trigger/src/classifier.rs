//! The four stage window classifier.
//!
//! Stages run in order and stop at the first failure:
//! 1. hit count within `hit_min..=hit_max`,
//! 2. at least `double_min` velocity consistent doublets,
//! 3. doublet directions clustering in azimuth and zenith, or more than
//!    `triple_min` triplets, depending on the [ClusteringCut],
//! 4. low-gain fraction above `slcfraction_min`.
use crate::{
    config::{ClusteringCut, TriggerConfig},
    doublets::PairEvaluator,
    services::Geometry,
    window::SlidingWindow,
};
use faint_particle_common::metrics::window_cuts::CutKind;
use tracing::trace;

/// The outcome of classifying one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// Names the first stage the window failed.
    Fail(CutKind),
}

pub struct WindowClassifier<'a, G> {
    config: &'a TriggerConfig,
    evaluator: PairEvaluator<'a, G>,
}

impl<'a, G: Geometry> WindowClassifier<'a, G> {
    pub fn new(config: &'a TriggerConfig, geometry: &'a G) -> Self {
        Self {
            config,
            evaluator: PairEvaluator::new(geometry, config.velocity_window()),
        }
    }

    pub fn classify(&self, window: &SlidingWindow) -> Verdict {
        if !window.has_hit_count_in(&self.config.hit_range()) {
            return Verdict::Fail(CutKind::HitCount);
        }

        let hits = window.hits();
        let doublets = self.evaluator.doublets(hits);
        trace!("{window}: {} doublets", doublets.len());
        if doublets.len() < self.config.double_min() {
            return Verdict::Fail(CutKind::Doublet);
        }

        match self.config.clustering() {
            ClusteringCut::Direction {
                histogram_binning,
                azimuth_histogram_min,
                zenith_histogram_min,
            } => {
                let peaks = self
                    .evaluator
                    .direction_peaks(hits, &doublets, *histogram_binning);
                trace!(
                    "{window}: azimuth peak {}, zenith peak {}",
                    peaks.azimuth, peaks.zenith
                );
                if peaks.azimuth <= *azimuth_histogram_min || peaks.zenith <= *zenith_histogram_min
                {
                    return Verdict::Fail(CutKind::Direction);
                }
            }
            ClusteringCut::Triplet { triple_min } => {
                let triplets = self.evaluator.count_triplets(hits, &doublets);
                trace!("{window}: {triplets} triplets");
                if triplets <= *triple_min {
                    return Verdict::Fail(CutKind::Triplet);
                }
            }
        }

        // An empty window has no defined fraction, and never gets this far.
        match window.low_gain_fraction() {
            Some(fraction) if fraction > self.config.slcfraction_min() => Verdict::Pass,
            _ => Verdict::Fail(CutKind::SignalFraction),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        config::TriggerConfigBuilder,
        detector::SensorTable,
        hit::{Hit, SharedHit},
    };
    use faint_particle_common::{SensorId, Ticks};
    use std::rc::Rc;

    /// Ticks a particle at 100,000 km/s takes to cross 100 m.
    pub(crate) const TICKS_PER_STEP: Ticks = 10_000;

    /// Triplet mode, 5 µs windows, speeds between 50,000 and 200,000 km/s.
    pub(crate) const TRIPLET_MODE: [(&str, &str); 10] = [
        ("time_window", "5000"),
        ("time_window_separation", "5000"),
        ("max_trigger_length", "12000"),
        ("hit_min", "3"),
        ("hit_max", "5"),
        ("double_velocity_min", "50000"),
        ("double_velocity_max", "200000"),
        ("double_min", "2"),
        ("use_dc_version", "false"),
        ("slcfraction_min", "0.5"),
    ];

    pub(crate) fn config_with(extra: &[(&str, &str)]) -> TriggerConfig {
        let mut builder = TriggerConfigBuilder::new();
        for (name, value) in TRIPLET_MODE.iter().chain(extra) {
            builder.add_parameter(name, value).unwrap();
        }
        builder.build().unwrap()
    }

    /// Sensors every 100 m along +x.
    pub(crate) fn line_of_sensors() -> SensorTable {
        SensorTable::from_positions((0..32).map(|i| (i, [100.0 * i as f64, 0.0, 0.0])))
    }

    /// `count` hits of a particle moving along the line at 100,000 km/s.
    pub(crate) fn track(
        start: Ticks,
        first_sensor: SensorId,
        count: u32,
        low_gain: bool,
    ) -> Vec<SharedHit> {
        (0..count)
            .map(|i| {
                Rc::new(Hit::new(
                    start + i as Ticks * TICKS_PER_STEP,
                    first_sensor + i,
                    low_gain,
                ))
            })
            .collect()
    }

    fn window_of(config: &TriggerConfig, hits: &[SharedHit]) -> SlidingWindow {
        let mut window = SlidingWindow::new(config.window_duration(), config.window_separation());
        for hit in hits {
            window.anchor(hit.time);
            window.insert(hit);
        }
        window
    }

    fn verdict(config: &TriggerConfig, hits: &[SharedHit]) -> Verdict {
        let geometry = line_of_sensors();
        WindowClassifier::new(config, &geometry).classify(&window_of(config, hits))
    }

    #[test]
    fn track_passes() {
        let config = config_with(&[("triple_min", "0")]);
        assert_eq!(verdict(&config, &track(0, 0, 3, true)), Verdict::Pass);
    }

    #[test]
    fn hit_count_bounds_are_inclusive() {
        let config = config_with(&[("triple_min", "0")]);
        assert_eq!(
            verdict(&config, &track(0, 0, 2, true)),
            Verdict::Fail(CutKind::HitCount)
        );
        assert_eq!(verdict(&config, &track(0, 0, 3, true)), Verdict::Pass);
        assert_eq!(verdict(&config, &track(0, 0, 5, true)), Verdict::Pass);
        assert_eq!(
            verdict(&config, &track(0, 0, 6, true)),
            Verdict::Fail(CutKind::HitCount)
        );
    }

    #[test]
    fn too_few_doublets() {
        let config = config_with(&[("triple_min", "0")]);
        // Every hit on one sensor, so no pair qualifies.
        let hits: Vec<_> = (0..3)
            .map(|i| Rc::new(Hit::new(i * TICKS_PER_STEP, 7, true)))
            .collect();
        assert_eq!(verdict(&config, &hits), Verdict::Fail(CutKind::Doublet));
    }

    #[test]
    fn triplet_count_must_exceed_minimum() {
        // Three hits along a track form exactly one triplet.
        let hits = track(0, 0, 3, true);
        assert_eq!(verdict(&config_with(&[("triple_min", "0")]), &hits), Verdict::Pass);
        assert_eq!(
            verdict(&config_with(&[("triple_min", "1")]), &hits),
            Verdict::Fail(CutKind::Triplet)
        );
    }

    #[test]
    fn direction_clustering() {
        let direction_mode = |azimuth_min: &str, zenith_min: &str| {
            let mut builder = TriggerConfigBuilder::new();
            for (name, value) in TRIPLET_MODE.iter().chain(&[
                ("use_dc_version", "true"),
                ("histogram_binning", "10"),
                ("azimuth_histogram_min", azimuth_min),
                ("zenith_histogram_min", zenith_min),
            ]) {
                builder.add_parameter(name, value).unwrap();
            }
            builder.build().unwrap()
        };

        // Three doublets, all pointing along +x.
        let hits = track(0, 0, 3, true);
        assert_eq!(verdict(&direction_mode("2", "2"), &hits), Verdict::Pass);
        assert_eq!(
            verdict(&direction_mode("3", "2"), &hits),
            Verdict::Fail(CutKind::Direction)
        );
        assert_eq!(
            verdict(&direction_mode("2", "3"), &hits),
            Verdict::Fail(CutKind::Direction)
        );
    }

    #[test]
    fn signal_fraction_must_exceed_minimum() {
        let config = config_with(&[("triple_min", "0")]);
        assert_eq!(
            verdict(&config, &track(0, 0, 3, false)),
            Verdict::Fail(CutKind::SignalFraction)
        );

        // Two of four hits are low-gain: a fraction of exactly 0.5 fails.
        let mut hits = track(0, 0, 2, true);
        hits.extend(track(2 * TICKS_PER_STEP, 2, 2, false));
        assert_eq!(verdict(&config, &hits), Verdict::Fail(CutKind::SignalFraction));

        hits = track(0, 0, 3, true);
        hits.extend(track(3 * TICKS_PER_STEP, 3, 1, false));
        assert_eq!(verdict(&config, &hits), Verdict::Pass);
    }
}
