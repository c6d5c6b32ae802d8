//! Interfaces to the collaborators the trigger depends on.
//!
//! The engine owns one implementation of each, supplied at construction.
use crate::{
    detector::DetectorDescription,
    error::{ConfigurationError, ConfigurationResult},
    hit::{Hit, HitKind, SharedHit},
};
use faint_particle_common::{SensorId, SensorSetId, Ticks};
use std::collections::HashSet;
use tracing::info;

/// Direction of the displacement from one sensor to another, in radians.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    pub zenith: f64,
    pub azimuth: f64,
}

/// Answers spatial questions about pairs of sensors.
pub trait Geometry {
    /// Distance between two sensors, in metres.
    fn distance(&self, from: SensorId, to: SensorId) -> f64;

    fn direction(&self, from: SensorId, to: SensorId) -> Direction;
}

/// Decides which hits take part in the trigger.
pub trait HitClassifier {
    fn is_usable(&self, hit: &Hit) -> bool;

    fn hit_kind(&self, hit: &Hit) -> HitKind;
}

/// A merged, time ordered group of hits that passed the trigger.
#[derive(Debug, Clone)]
pub struct CandidateTrigger {
    /// Counts triggers emitted by one engine, starting at zero.
    pub number: u64,
    pub hits: Vec<SharedHit>,
}

impl CandidateTrigger {
    pub fn first_time(&self) -> Option<Ticks> {
        self.hits.first().map(|hit| hit.time)
    }

    pub fn last_time(&self) -> Option<Ticks> {
        self.hits.last().map(|hit| hit.time)
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Receives every trigger the engine emits.
pub trait TriggerSink {
    fn emit(&mut self, trigger: CandidateTrigger);
}

impl TriggerSink for Vec<CandidateTrigger> {
    fn emit(&mut self, trigger: CandidateTrigger) {
        self.push(trigger);
    }
}

/// Accepts hits from a fixed set of sensors and reports the kind the digitiser assigned.
#[derive(Debug, Clone, Default)]
pub struct SensorSetFilter {
    sensors: HashSet<SensorId>,
}

impl SensorSetFilter {
    pub fn new(sensors: impl IntoIterator<Item = SensorId>) -> Self {
        Self {
            sensors: sensors.into_iter().collect(),
        }
    }

    /// Builds the filter for the sensor set `set_id`, or for every described sensor if `None`.
    ///
    /// # Error Modes
    /// - [ConfigurationError::UnknownSensorSet] if the description has no set `set_id`.
    pub fn from_description(
        description: &DetectorDescription,
        set_id: Option<SensorSetId>,
    ) -> ConfigurationResult<Self> {
        let filter = match set_id {
            Some(set_id) => {
                let set = description
                    .sensor_set(set_id)
                    .ok_or(ConfigurationError::UnknownSensorSet(set_id))?;
                info!(
                    "Using sensor set {set_id} ({}) with {} sensors",
                    set.name.as_deref().unwrap_or("unnamed"),
                    set.sensors.len()
                );
                Self::new(set.sensors.iter().copied())
            }
            None => Self::new(description.sensors.iter().map(|sensor| sensor.id)),
        };
        Ok(filter)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

impl HitClassifier for SensorSetFilter {
    fn is_usable(&self, hit: &Hit) -> bool {
        self.sensors.contains(&hit.sensor)
    }

    fn hit_kind(&self, hit: &Hit) -> HitKind {
        hit.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_by_sensor() {
        let filter = SensorSetFilter::new([1, 2, 3]);
        assert!(filter.is_usable(&Hit::new(0, 2, false)));
        assert!(!filter.is_usable(&Hit::new(0, 4, false)));
        assert_eq!(filter.len(), 3);
    }

    #[test]
    fn filter_from_description() {
        let description = DetectorDescription::from_json_str(
            r#"{
                "sensors": [
                    { "id": 1, "x": 0, "y": 0, "z": 0 },
                    { "id": 2, "x": 1, "y": 0, "z": 0 },
                    { "id": 3, "x": 2, "y": 0, "z": 0 }
                ],
                "sensor-sets": [ { "id": 7, "name": "inner", "sensors": [1, 3] } ]
            }"#,
        )
        .unwrap();

        let all = SensorSetFilter::from_description(&description, None).unwrap();
        assert_eq!(all.len(), 3);

        let inner = SensorSetFilter::from_description(&description, Some(7)).unwrap();
        assert!(inner.is_usable(&Hit::new(0, 3, true)));
        assert!(!inner.is_usable(&Hit::new(0, 2, true)));

        assert_eq!(
            SensorSetFilter::from_description(&description, Some(8)).unwrap_err(),
            ConfigurationError::UnknownSensorSet(8)
        );
    }
}
