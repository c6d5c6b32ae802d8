use crate::scenario::{NoiseSource, Scenario, ScenarioError, TrackSource};
use faint_particle_common::{TICKS_PER_NANOSECOND, Ticks};
use faint_particle_trigger::{DetectorDescription, Hit, HitKind};
use rand::Rng;
use rand_distr::{Distribution, Exp};
use tracing::debug;

/// Metres per nanosecond in one km/s.
const METRES_PER_NANOSECOND_PER_KILOMETRE_PER_SECOND: f64 = 1e-6;

fn to_ticks(nanoseconds: f64) -> Ticks {
    (nanoseconds * TICKS_PER_NANOSECOND as f64).round() as Ticks
}

/// Generates the hits of every source in the scenario, in time order.
pub(crate) fn generate<R: Rng>(
    scenario: &Scenario,
    detector: &DetectorDescription,
    rng: &mut R,
) -> Result<Vec<Hit>, ScenarioError> {
    scenario.validate()?;

    let mut hits = Vec::new();
    if let Some(noise) = &scenario.noise {
        hits.extend(generate_noise(noise, scenario.duration_ns, detector, rng)?);
    }
    for track in &scenario.tracks {
        let track_hits = generate_track(track, detector, rng);
        debug!("Track from {:?}: {} hits", track.origin, track_hits.len());
        hits.extend(track_hits);
    }

    let end = to_ticks(scenario.duration_ns as f64);
    hits.retain(|hit| (0..end).contains(&hit.time));
    hits.sort_by_key(|hit| hit.time);
    Ok(hits)
}

/// Poisson distributed hits on each sensor, independently.
fn generate_noise<R: Rng>(
    noise: &NoiseSource,
    duration_ns: i64,
    detector: &DetectorDescription,
    rng: &mut R,
) -> Result<Vec<Hit>, ScenarioError> {
    let per_nanosecond = noise.rate_hz * 1e-9;
    let interval = Exp::new(per_nanosecond).map_err(|_| ScenarioError::InvalidNoiseRate(noise.rate_hz))?;

    let mut hits = Vec::new();
    for sensor in &detector.sensors {
        let mut time = interval.sample(rng);
        while time < duration_ns as f64 {
            let mut hit = Hit::new(to_ticks(time), sensor.id, rng.random_bool(noise.low_gain_probability));
            if rng.random_bool(noise.other_kind_probability) {
                hit.kind = HitKind::Other;
            }
            hits.push(hit);
            time += interval.sample(rng);
        }
    }
    debug!("Noise: {} hits", hits.len());
    Ok(hits)
}

/// One hit on every sensor within the track's hit radius, at the time the
/// particle passes closest to it.
fn generate_track<R: Rng>(
    track: &TrackSource,
    detector: &DetectorDescription,
    rng: &mut R,
) -> Vec<Hit> {
    let norm = track.direction.iter().map(|c| c * c).sum::<f64>().sqrt();
    let [dx, dy, dz] = track.direction.map(|c| c / norm);
    let [ox, oy, oz] = track.origin;
    let metres_per_nanosecond = track.speed_km_s * METRES_PER_NANOSECOND_PER_KILOMETRE_PER_SECOND;

    detector
        .sensors
        .iter()
        .filter_map(|sensor| {
            let [vx, vy, vz] = [sensor.x - ox, sensor.y - oy, sensor.z - oz];
            let along = vx * dx + vy * dy + vz * dz;
            if !(0.0..=track.length_m).contains(&along) {
                return None;
            }
            let [px, py, pz] = [vx - along * dx, vy - along * dy, vz - along * dz];
            if (px * px + py * py + pz * pz).sqrt() > track.hit_radius_m {
                return None;
            }
            if !rng.random_bool(track.detection_probability) {
                return None;
            }
            let time = track.start_time_ns as f64 + along / metres_per_nanosecond;
            Some(Hit::new(
                to_ticks(time),
                sensor.id,
                rng.random_bool(track.low_gain_probability),
            ))
        })
        .collect()
}
