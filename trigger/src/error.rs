use faint_particle_common::{SensorId, SensorSetId, Ticks};
use thiserror::Error;

pub type TriggerResult<T> = Result<T, TriggerError>;

pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

#[derive(Debug, Error, PartialEq)]
pub enum TriggerError {
    #[error("Hit comes before previous hit: previous hit is at {previous}, hit is at {current}, sensor = {sensor}")]
    OutOfOrder {
        previous: Ticks,
        current: Ticks,
        sensor: SensorId,
    },
    #[error("Hit time {time} on sensor {sensor} is too late for a window of {duration} ticks to end after it")]
    TimeOutOfRange {
        time: Ticks,
        duration: Ticks,
        sensor: SensorId,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("Value '{value}' for {name} is out of range: {reason}")]
    OutOfRange {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("time_window_separation ({separation} ns) must not exceed time_window ({window} ns)")]
    SeparationExceedsWindow { separation: i64, window: i64 },
    #[error("Configuration incomplete, missing: {}", missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },
    #[error("Bad sensor set #{0}")]
    UnknownSensorSet(SensorSetId),
}

#[derive(Debug, Error)]
pub enum DetectorDescriptionError {
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Sensor {0} is listed more than once")]
    DuplicateSensor(SensorId),
    #[error("Sensor set {set} refers to unknown sensor {sensor}")]
    UnknownSensorInSet { set: SensorSetId, sensor: SensorId },
}
