use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum ScenarioError {
    #[error("Duration must be positive, got {0} ns")]
    NonPositiveDuration(i64),
    #[error("Probability {name} must lie in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("Noise rate must be positive and finite, got {0} Hz")]
    InvalidNoiseRate(f64),
    #[error("Track {track}: speed must be positive and finite, got {speed} km/s")]
    InvalidSpeed { track: usize, speed: f64 },
    #[error("Track {track}: direction must be a non-zero vector")]
    ZeroDirection { track: usize },
    #[error("Track {track}: {name} must not be negative")]
    NegativeExtent { track: usize, name: &'static str },
}

///
/// This struct is created from the scenario JSON file.
///
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Scenario {
    /// Length of the generated stream
    pub(crate) duration_ns: i64,
    /// If absent the generator is seeded from the operating system
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    #[serde(default)]
    pub(crate) noise: Option<NoiseSource>,
    #[serde(default)]
    pub(crate) tracks: Vec<TrackSource>,
}

/// Uncorrelated hits on every sensor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct NoiseSource {
    /// Mean hit rate of each sensor
    pub(crate) rate_hz: f64,
    pub(crate) low_gain_probability: f64,
    /// Fraction of noise hits reported as something other than a single pulse
    #[serde(default)]
    pub(crate) other_kind_probability: f64,
}

/// A particle moving in a straight line at constant speed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct TrackSource {
    /// Time the particle is at `origin`
    pub(crate) start_time_ns: i64,
    /// Metres, in detector coordinates
    pub(crate) origin: [f64; 3],
    /// Need not be normalised
    pub(crate) direction: [f64; 3],
    pub(crate) speed_km_s: f64,
    /// Distance travelled from `origin`
    pub(crate) length_m: f64,
    /// Sensors within this distance of the path may see the particle
    pub(crate) hit_radius_m: f64,
    #[serde(default = "certain")]
    pub(crate) detection_probability: f64,
    pub(crate) low_gain_probability: f64,
}

fn certain() -> f64 {
    1.0
}

fn probability(name: &'static str, value: f64) -> Result<(), ScenarioError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ScenarioError::InvalidProbability { name, value })
    }
}

impl Scenario {
    pub(crate) fn validate(&self) -> Result<(), ScenarioError> {
        if self.duration_ns <= 0 {
            return Err(ScenarioError::NonPositiveDuration(self.duration_ns));
        }
        if let Some(noise) = &self.noise {
            if !(noise.rate_hz.is_finite() && noise.rate_hz > 0.0) {
                return Err(ScenarioError::InvalidNoiseRate(noise.rate_hz));
            }
            probability("low-gain-probability", noise.low_gain_probability)?;
            probability("other-kind-probability", noise.other_kind_probability)?;
        }
        for (track, source) in self.tracks.iter().enumerate() {
            if !(source.speed_km_s.is_finite() && source.speed_km_s > 0.0) {
                return Err(ScenarioError::InvalidSpeed {
                    track,
                    speed: source.speed_km_s,
                });
            }
            if source.direction.iter().all(|&component| component == 0.0) {
                return Err(ScenarioError::ZeroDirection { track });
            }
            if source.length_m < 0.0 {
                return Err(ScenarioError::NegativeExtent {
                    track,
                    name: "length-m",
                });
            }
            if source.hit_radius_m < 0.0 {
                return Err(ScenarioError::NegativeExtent {
                    track,
                    name: "hit-radius-m",
                });
            }
            probability("detection-probability", source.detection_probability)?;
            probability("low-gain-probability", source.low_gain_probability)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_INPUT_1: &str = r#"
    {
        "duration-ns": 1000000,
        "seed": 42,
        "noise": { "rate-hz": 500, "low-gain-probability": 0.3 },
        "tracks": [
            {
                "start-time-ns": 20000,
                "origin": [0, 0, -500],
                "direction": [0, 0, 1],
                "speed-km-s": 300,
                "length-m": 1000,
                "hit-radius-m": 50,
                "low-gain-probability": 0.9
            }
        ]
    }
    "#;

    #[test]
    fn test1() {
        let scenario: Scenario = serde_json::from_str(JSON_INPUT_1).unwrap();
        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.duration_ns, 1_000_000);
        assert_eq!(scenario.seed, Some(42));

        let noise = scenario.noise.as_ref().unwrap();
        assert_eq!(noise.rate_hz, 500.0);
        assert_eq!(noise.other_kind_probability, 0.0);

        let track = scenario.tracks.first().unwrap();
        assert_eq!(track.origin, [0.0, 0.0, -500.0]);
        assert_eq!(track.detection_probability, 1.0);
    }

    #[test]
    fn noise_and_tracks_are_optional() {
        let scenario: Scenario = serde_json::from_str(r#"{ "duration-ns": 5 }"#).unwrap();
        assert!(scenario.noise.is_none());
        assert!(scenario.tracks.is_empty());
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn invalid_scenarios() {
        let scenario: Scenario = serde_json::from_str(r#"{ "duration-ns": 0 }"#).unwrap();
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::NonPositiveDuration(0))
        );

        let scenario: Scenario = serde_json::from_str(
            r#"{
                "duration-ns": 10,
                "noise": { "rate-hz": 500, "low-gain-probability": 1.5 }
            }"#,
        )
        .unwrap();
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::InvalidProbability {
                name: "low-gain-probability",
                value: 1.5
            })
        );

        let scenario: Scenario = serde_json::from_str(
            r#"{
                "duration-ns": 10,
                "tracks": [{
                    "start-time-ns": 0, "origin": [0, 0, 0], "direction": [0, 0, 0],
                    "speed-km-s": 300, "length-m": 10, "hit-radius-m": 5,
                    "low-gain-probability": 0.5
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::ZeroDirection { track: 0 })
        );
    }
}
