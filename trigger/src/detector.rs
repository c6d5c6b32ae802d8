//! Static description of the sensor array, loaded from JSON.
use crate::{
    error::DetectorDescriptionError,
    services::{Direction, Geometry},
};
use faint_particle_common::{SensorId, SensorSetId};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    f64::consts::TAU,
    fs::File,
    io::BufReader,
    path::Path,
};
use tracing::debug;

/// Position of one sensor, in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorPosition {
    pub id: SensorId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A named subset of sensors, selectable with the `domSet` parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSet {
    pub id: SensorSetId,
    #[serde(default)]
    pub name: Option<String>,
    pub sensors: Vec<SensorId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DetectorDescription {
    pub sensors: Vec<SensorPosition>,
    #[serde(default)]
    pub sensor_sets: Vec<SensorSet>,
}

impl DetectorDescription {
    pub fn load(path: &Path) -> Result<Self, DetectorDescriptionError> {
        let description: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        description.validate()?;
        debug!(
            "Loaded {} sensors and {} sensor sets from {}",
            description.sensors.len(),
            description.sensor_sets.len(),
            path.display()
        );
        Ok(description)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DetectorDescriptionError> {
        let description: Self = serde_json::from_str(json)?;
        description.validate()?;
        Ok(description)
    }

    /// Checks sensor ids are unique and that every set member is a described sensor.
    pub fn validate(&self) -> Result<(), DetectorDescriptionError> {
        let mut ids = HashSet::with_capacity(self.sensors.len());
        for sensor in &self.sensors {
            if !ids.insert(sensor.id) {
                return Err(DetectorDescriptionError::DuplicateSensor(sensor.id));
            }
        }
        for set in &self.sensor_sets {
            if let Some(&sensor) = set.sensors.iter().find(|sensor| !ids.contains(sensor)) {
                return Err(DetectorDescriptionError::UnknownSensorInSet {
                    set: set.id,
                    sensor,
                });
            }
        }
        Ok(())
    }

    pub fn sensor_set(&self, id: SensorSetId) -> Option<&SensorSet> {
        self.sensor_sets.iter().find(|set| set.id == id)
    }
}

/// Position lookup implementing [Geometry] for the described sensors.
///
/// Pairs involving an undescribed sensor have a `NaN` distance, which no
/// velocity window admits.
#[derive(Debug, Clone, Default)]
pub struct SensorTable {
    positions: HashMap<SensorId, [f64; 3]>,
}

impl SensorTable {
    pub fn new(description: &DetectorDescription) -> Self {
        Self::from_positions(
            description
                .sensors
                .iter()
                .map(|sensor| (sensor.id, [sensor.x, sensor.y, sensor.z])),
        )
    }

    pub fn from_positions(positions: impl IntoIterator<Item = (SensorId, [f64; 3])>) -> Self {
        Self {
            positions: positions.into_iter().collect(),
        }
    }

    fn displacement(&self, from: SensorId, to: SensorId) -> Option<[f64; 3]> {
        let [x0, y0, z0] = self.positions.get(&from)?;
        let [x1, y1, z1] = self.positions.get(&to)?;
        Some([x1 - x0, y1 - y0, z1 - z0])
    }
}

impl Geometry for SensorTable {
    fn distance(&self, from: SensorId, to: SensorId) -> f64 {
        self.displacement(from, to)
            .map(|[dx, dy, dz]| (dx * dx + dy * dy + dz * dz).sqrt())
            .unwrap_or(f64::NAN)
    }

    /// Zenith is measured from +z, in `[0, π]`. Azimuth is measured from +x towards +y, in `[0, 2π)`.
    fn direction(&self, from: SensorId, to: SensorId) -> Direction {
        let Some([dx, dy, dz]) = self.displacement(from, to) else {
            return Direction {
                zenith: f64::NAN,
                azimuth: f64::NAN,
            };
        };
        let length = (dx * dx + dy * dy + dz * dz).sqrt();
        if length == 0.0 {
            return Direction::default();
        }
        Direction {
            zenith: (dz / length).clamp(-1.0, 1.0).acos(),
            azimuth: dy.atan2(dx).rem_euclid(TAU),
        }
    }
}
