//! Pair and triple evaluation over the hits of a window.
//!
//! A doublet is a pair of hits on different sensors whose apparent speed,
//! distance over time difference, lies strictly inside the configured
//! velocity window. Doublets are recomputed for every window classified.
use crate::{
    hit::{Hit, SharedHit},
    histogram::{AZIMUTH_DOMAIN, ZENITH_DOMAIN, max_bin_occupancy},
    services::Geometry,
};
use faint_particle_common::KILOMETRES_PER_SECOND_PER_METRE_PER_TICK;
use itertools::Itertools;
use std::num::NonZeroU32;

/// The open interval of apparent speeds, in km/s, a doublet must fall in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityWindow {
    min: f64,
    max: f64,
}

impl VelocityWindow {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Both ends are excluded.
    pub fn admits(&self, speed: f64) -> bool {
        speed > self.min && speed < self.max
    }
}

/// Apparent speed between two hits in km/s, or `None` if they are simultaneous.
pub fn apparent_speed<G: Geometry>(geometry: &G, a: &Hit, b: &Hit) -> Option<f64> {
    let ticks = b.time.abs_diff(a.time);
    if ticks == 0 {
        None
    } else {
        Some(
            geometry.distance(a.sensor, b.sensor) / ticks as f64
                * KILOMETRES_PER_SECOND_PER_METRE_PER_TICK,
        )
    }
}

/// Indices into the window's hits, with `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Doublet {
    pub first: usize,
    pub second: usize,
}

/// Highest azimuth and zenith bin counts over a set of doublet directions.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionPeaks {
    pub azimuth: usize,
    pub zenith: usize,
}

pub(crate) struct PairEvaluator<'a, G> {
    geometry: &'a G,
    velocity_window: VelocityWindow,
}

impl<'a, G: Geometry> PairEvaluator<'a, G> {
    pub(crate) fn new(geometry: &'a G, velocity_window: VelocityWindow) -> Self {
        Self {
            geometry,
            velocity_window,
        }
    }

    fn is_velocity_consistent(&self, a: &Hit, b: &Hit) -> bool {
        a.sensor != b.sensor
            && apparent_speed(self.geometry, a, b)
                .is_some_and(|speed| self.velocity_window.admits(speed))
    }

    /// Every qualifying pair, ordered by first index then second index.
    pub(crate) fn doublets(&self, hits: &[SharedHit]) -> Vec<Doublet> {
        hits.iter()
            .enumerate()
            .tuple_combinations()
            .filter(|((_, a), (_, b))| self.is_velocity_consistent(a, b))
            .map(|((first, _), (second, _))| Doublet { first, second })
            .collect()
    }

    /// Counts pairs of doublets `(a, b)`, `(b, c)` sharing the middle hit
    /// whose outer hits `a`, `c` also form a velocity consistent pair.
    pub(crate) fn count_triplets(&self, hits: &[SharedHit], doublets: &[Doublet]) -> usize {
        doublets
            .iter()
            .tuple_combinations()
            .filter(|(ab, bc)| ab.second == bc.first)
            .filter(|(ab, bc)| match (hits.get(ab.first), hits.get(bc.second)) {
                (Some(a), Some(c)) => self.is_velocity_consistent(a, c),
                _ => false,
            })
            .count()
    }

    /// Histograms the sensor to sensor direction of every doublet.
    pub(crate) fn direction_peaks(
        &self,
        hits: &[SharedHit],
        doublets: &[Doublet],
        bin_width: NonZeroU32,
    ) -> DirectionPeaks {
        let (zeniths, azimuths): (Vec<f64>, Vec<f64>) = doublets
            .iter()
            .filter_map(|doublet| Some((hits.get(doublet.first)?, hits.get(doublet.second)?)))
            .map(|(a, b)| {
                let direction = self.geometry.direction(a.sensor, b.sensor);
                (direction.zenith.to_degrees(), direction.azimuth.to_degrees())
            })
            .unzip();

        DirectionPeaks {
            azimuth: max_bin_occupancy(&azimuths, AZIMUTH_DOMAIN, bin_width),
            zenith: max_bin_occupancy(&zeniths, ZENITH_DOMAIN, bin_width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::SensorTable;
    use assert_approx_eq::assert_approx_eq;
    use std::rc::Rc;

    /// 100 m in 100 µs, i.e. 1000 km/s.
    const TICKS_PER_SPACING: i64 = 1_000_000;

    /// Sensors every 100 m along +x.
    fn line_of_sensors() -> SensorTable {
        SensorTable::from_positions((0..10).map(|i| (i, [100.0 * i as f64, 0.0, 0.0])))
    }

    fn hits(list: &[(i64, u32)]) -> Vec<SharedHit> {
        list.iter()
            .map(|&(time, sensor)| Rc::new(Hit::new(time, sensor, true)))
            .collect()
    }

    #[test]
    fn speed_in_km_per_s() {
        let geometry = line_of_sensors();
        let speed = apparent_speed(
            &geometry,
            &Hit::new(0, 0, false),
            &Hit::new(TICKS_PER_SPACING, 1, false),
        )
        .unwrap();
        assert_approx_eq!(speed, 1000.0, 1e-9);
        assert_eq!(
            apparent_speed(&geometry, &Hit::new(5, 0, false), &Hit::new(5, 1, false)),
            None
        );
    }

    #[test]
    fn velocity_window_is_open() {
        let window = VelocityWindow::new(50.0, 150.0);
        assert!(!window.admits(50.0));
        assert!(window.admits(50.000001));
        assert!(window.admits(149.99999));
        assert!(!window.admits(150.0));
        assert!(!window.admits(f64::NAN));
    }

    #[test]
    fn boundary_speeds_do_not_qualify() {
        let geometry = line_of_sensors();
        let window_hits = hits(&[(0, 0), (TICKS_PER_SPACING, 1)]);
        let speed = apparent_speed(&geometry, &window_hits[0], &window_hits[1]).unwrap();

        let at_min = PairEvaluator::new(&geometry, VelocityWindow::new(speed, 2.0 * speed));
        assert!(at_min.doublets(&window_hits).is_empty());

        let at_max = PairEvaluator::new(&geometry, VelocityWindow::new(0.5 * speed, speed));
        assert!(at_max.doublets(&window_hits).is_empty());

        let inside = PairEvaluator::new(&geometry, VelocityWindow::new(0.5 * speed, 2.0 * speed));
        assert_eq!(
            inside.doublets(&window_hits),
            vec![Doublet {
                first: 0,
                second: 1
            }]
        );
    }

    #[test]
    fn same_sensor_pairs_are_skipped() {
        let geometry = line_of_sensors();
        let evaluator = PairEvaluator::new(&geometry, VelocityWindow::new(0.0, f64::MAX));
        let window_hits = hits(&[(0, 3), (10, 3), (20, 4)]);
        assert_eq!(
            evaluator.doublets(&window_hits),
            vec![
                Doublet {
                    first: 0,
                    second: 2
                },
                Doublet {
                    first: 1,
                    second: 2
                }
            ]
        );
    }

    #[test]
    fn chained_doublets_make_a_triplet() {
        let geometry = line_of_sensors();
        let evaluator = PairEvaluator::new(&geometry, VelocityWindow::new(900.0, 1100.0));
        // A particle moving at 1000 km/s along the line.
        let window_hits = hits(&[(0, 0), (TICKS_PER_SPACING, 1), (2 * TICKS_PER_SPACING, 2)]);
        let doublets = evaluator.doublets(&window_hits);
        assert_eq!(doublets.len(), 3);
        assert_eq!(evaluator.count_triplets(&window_hits, &doublets), 1);
    }

    #[test]
    fn unshared_doublets_make_no_triplet() {
        let geometry = line_of_sensors();
        let evaluator = PairEvaluator::new(&geometry, VelocityWindow::new(900.0, 1100.0));
        // Two separate particles, on sensors (0, 1) and (5, 6): the doublets share no hit.
        let window_hits = hits(&[
            (0, 0),
            (TICKS_PER_SPACING, 1),
            (50 * TICKS_PER_SPACING, 5),
            (51 * TICKS_PER_SPACING, 6),
        ]);
        let doublets = evaluator.doublets(&window_hits);
        assert_eq!(
            doublets,
            vec![
                Doublet {
                    first: 0,
                    second: 1
                },
                Doublet {
                    first: 2,
                    second: 3
                }
            ]
        );
        assert_eq!(evaluator.count_triplets(&window_hits, &doublets), 0);
    }

    #[test]
    fn triplet_needs_consistent_outer_pair() {
        // Sensor 2 sits next to sensor 0, so the outer pair is far too slow.
        let geometry = SensorTable::from_positions([
            (0, [0.0, 0.0, 0.0]),
            (1, [100.0, 0.0, 0.0]),
            (2, [1.0, 0.0, 0.0]),
        ]);
        let evaluator = PairEvaluator::new(&geometry, VelocityWindow::new(900.0, 1100.0));
        let window_hits = hits(&[(0, 0), (TICKS_PER_SPACING, 1), (1_990_000, 2)]);
        let doublets = evaluator.doublets(&window_hits);
        assert_eq!(doublets.len(), 2);
        assert_eq!(evaluator.count_triplets(&window_hits, &doublets), 0);
    }

    #[test]
    fn directions_cluster() {
        let geometry = line_of_sensors();
        let evaluator = PairEvaluator::new(&geometry, VelocityWindow::new(900.0, 1100.0));
        let window_hits = hits(&[
            (0, 0),
            (TICKS_PER_SPACING, 1),
            (2 * TICKS_PER_SPACING, 2),
            (3 * TICKS_PER_SPACING, 3),
        ]);
        let doublets = evaluator.doublets(&window_hits);
        assert_eq!(doublets.len(), 6);

        // All along +x: zenith 90°, azimuth 0°.
        let peaks =
            evaluator.direction_peaks(&window_hits, &doublets, NonZeroU32::new(10).unwrap());
        assert_eq!(
            peaks,
            DirectionPeaks {
                azimuth: 6,
                zenith: 6
            }
        );
    }
}
