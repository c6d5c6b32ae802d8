//! Trigger configuration.
//!
//! Parameters arrive one at a time by name, as strings, and are collected by
//! [TriggerConfigBuilder]. Each value is parsed and range checked as soon as
//! it is added. A [TriggerConfig] is only produced once every parameter the
//! selected clustering mode requires has been supplied.
use crate::{
    doublets::VelocityWindow,
    error::{ConfigurationError, ConfigurationResult},
};
use faint_particle_common::{SensorSetId, TICKS_PER_NANOSECOND, Ticks, nanoseconds_to_ticks};
use std::{fmt::Display, num::NonZeroU32, ops::RangeInclusive, str::FromStr};
use tracing::{debug, warn};

/// The named parameters understood by the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Parameter {
    TimeWindow,
    TimeWindowSeparation,
    MaxTriggerLength,
    HitMin,
    HitMax,
    DoubleVelocityMin,
    DoubleVelocityMax,
    DoubleMin,
    UseDcVersion,
    TripleMin,
    HistogramBinning,
    AzimuthHistogramMin,
    ZenithHistogramMin,
    SlcfractionMin,
    /// Selects the sensor subset used by the hit filter.
    #[strum(to_string = "domSet", serialize = "sensor_set")]
    SensorSet,
}

/// The third cut, whose shape depends on `use_dc_version`.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusteringCut {
    /// Doublet directions must cluster in azimuth and zenith (`use_dc_version = true`).
    Direction {
        /// Bin width in degrees.
        histogram_binning: NonZeroU32,
        azimuth_histogram_min: usize,
        zenith_histogram_min: usize,
    },
    /// Chained doublets must form velocity consistent triplets (`use_dc_version = false`).
    Triplet { triple_min: usize },
}

/// A complete trigger configuration.
///
/// Times are held in nanoseconds and velocities in km/s, as configured.
/// The accessors convert times to detector ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    time_window: i64,
    time_window_separation: i64,
    max_trigger_length: f64,
    hit_min: usize,
    hit_max: usize,
    velocity_window: VelocityWindow,
    double_min: usize,
    clustering: ClusteringCut,
    slcfraction_min: f64,
    sensor_set: Option<SensorSetId>,
}

impl TriggerConfig {
    pub fn window_duration(&self) -> Ticks {
        nanoseconds_to_ticks(self.time_window)
    }

    pub fn window_separation(&self) -> Ticks {
        nanoseconds_to_ticks(self.time_window_separation)
    }

    /// Maximum span of a merged trigger, in ticks.
    pub fn max_trigger_length(&self) -> f64 {
        self.max_trigger_length * TICKS_PER_NANOSECOND as f64
    }

    pub fn hit_range(&self) -> RangeInclusive<usize> {
        self.hit_min..=self.hit_max
    }

    pub fn velocity_window(&self) -> VelocityWindow {
        self.velocity_window
    }

    pub fn double_min(&self) -> usize {
        self.double_min
    }

    pub fn clustering(&self) -> &ClusteringCut {
        &self.clustering
    }

    pub fn use_dc_version(&self) -> bool {
        matches!(self.clustering, ClusteringCut::Direction { .. })
    }

    pub fn slcfraction_min(&self) -> f64 {
        self.slcfraction_min
    }

    pub fn sensor_set(&self) -> Option<SensorSetId> {
        self.sensor_set
    }
}

/// Collects named parameters until they form a [TriggerConfig].
#[derive(Default, Debug, Clone)]
pub struct TriggerConfigBuilder {
    time_window: Option<i64>,
    time_window_separation: Option<i64>,
    max_trigger_length: Option<f64>,
    hit_min: Option<usize>,
    hit_max: Option<usize>,
    double_velocity_min: Option<f64>,
    double_velocity_max: Option<f64>,
    double_min: Option<usize>,
    use_dc_version: Option<bool>,
    triple_min: Option<usize>,
    histogram_binning: Option<NonZeroU32>,
    azimuth_histogram_min: Option<usize>,
    zenith_histogram_min: Option<usize>,
    slcfraction_min: Option<f64>,
    sensor_set: Option<SensorSetId>,
}

impl TriggerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and stores a single parameter.
    ///
    /// # Error Modes
    /// - [ConfigurationError::UnknownParameter] if `name` is not a trigger parameter.
    /// - [ConfigurationError::InvalidValue] if `value` does not parse as the parameter's type.
    /// - [ConfigurationError::OutOfRange] if the parsed value is not allowed.
    ///
    /// A rejected parameter leaves the builder unchanged.
    pub fn add_parameter(&mut self, name: &str, value: &str) -> ConfigurationResult<()> {
        let parameter = Parameter::from_str(name.trim())
            .map_err(|_| ConfigurationError::UnknownParameter(name.to_owned()))?;
        let value = value.trim();

        match parameter {
            Parameter::TimeWindow => self.time_window = Some(positive(parameter, value)?),
            Parameter::TimeWindowSeparation => {
                self.time_window_separation = Some(positive(parameter, value)?)
            }
            Parameter::MaxTriggerLength => {
                self.max_trigger_length = Some(non_negative_real(parameter, value)?)
            }
            Parameter::HitMin => self.hit_min = Some(parse(parameter, value)?),
            Parameter::HitMax => self.hit_max = Some(parse(parameter, value)?),
            Parameter::DoubleVelocityMin => {
                self.double_velocity_min = Some(finite_real(parameter, value)?)
            }
            Parameter::DoubleVelocityMax => {
                self.double_velocity_max = Some(finite_real(parameter, value)?)
            }
            Parameter::DoubleMin => self.double_min = Some(parse(parameter, value)?),
            Parameter::UseDcVersion => self.use_dc_version = Some(flag(parameter, value)?),
            Parameter::TripleMin => self.triple_min = Some(parse(parameter, value)?),
            Parameter::HistogramBinning => self.histogram_binning = Some(parse(parameter, value)?),
            Parameter::AzimuthHistogramMin => {
                self.azimuth_histogram_min = Some(parse(parameter, value)?)
            }
            Parameter::ZenithHistogramMin => {
                self.zenith_histogram_min = Some(parse(parameter, value)?)
            }
            Parameter::SlcfractionMin => self.slcfraction_min = Some(finite_real(parameter, value)?),
            Parameter::SensorSet => self.sensor_set = Some(parse(parameter, value)?),
        }
        debug!("{parameter} set to {value}");
        Ok(())
    }

    /// Names of the parameters still required before [Self::build] can succeed.
    /// Until `use_dc_version` is set, the mode specific parameters are not listed.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = Vec::new();
        let mut require = |parameter: Parameter, is_set: bool| {
            if !is_set {
                missing.push(parameter.into());
            }
        };

        require(Parameter::TimeWindow, self.time_window.is_some());
        require(
            Parameter::TimeWindowSeparation,
            self.time_window_separation.is_some(),
        );
        require(Parameter::MaxTriggerLength, self.max_trigger_length.is_some());
        require(Parameter::HitMin, self.hit_min.is_some());
        require(Parameter::HitMax, self.hit_max.is_some());
        require(Parameter::DoubleVelocityMin, self.double_velocity_min.is_some());
        require(Parameter::DoubleVelocityMax, self.double_velocity_max.is_some());
        require(Parameter::DoubleMin, self.double_min.is_some());
        match self.use_dc_version {
            Some(true) => {
                require(Parameter::HistogramBinning, self.histogram_binning.is_some());
                require(
                    Parameter::AzimuthHistogramMin,
                    self.azimuth_histogram_min.is_some(),
                );
                require(
                    Parameter::ZenithHistogramMin,
                    self.zenith_histogram_min.is_some(),
                );
            }
            Some(false) => require(Parameter::TripleMin, self.triple_min.is_some()),
            None => require(Parameter::UseDcVersion, false),
        }
        require(Parameter::SlcfractionMin, self.slcfraction_min.is_some());
        missing
    }

    /// Returns true once every parameter required by the selected mode is set.
    pub fn is_configured(&self) -> bool {
        self.missing().is_empty()
    }

    /// # Error Modes
    /// - [ConfigurationError::Incomplete] if required parameters are missing.
    /// - [ConfigurationError::SeparationExceedsWindow] if consecutive windows would leave a gap.
    pub fn build(&self) -> ConfigurationResult<TriggerConfig> {
        let incomplete = || ConfigurationError::Incomplete {
            missing: self.missing(),
        };

        let (
            Some(time_window),
            Some(time_window_separation),
            Some(max_trigger_length),
            Some(hit_min),
            Some(hit_max),
            Some(double_velocity_min),
            Some(double_velocity_max),
            Some(double_min),
            Some(use_dc_version),
            Some(slcfraction_min),
        ) = (
            self.time_window,
            self.time_window_separation,
            self.max_trigger_length,
            self.hit_min,
            self.hit_max,
            self.double_velocity_min,
            self.double_velocity_max,
            self.double_min,
            self.use_dc_version,
            self.slcfraction_min,
        )
        else {
            return Err(incomplete());
        };

        let clustering = if use_dc_version {
            match (
                self.histogram_binning,
                self.azimuth_histogram_min,
                self.zenith_histogram_min,
            ) {
                (Some(histogram_binning), Some(azimuth_histogram_min), Some(zenith_histogram_min)) => {
                    ClusteringCut::Direction {
                        histogram_binning,
                        azimuth_histogram_min,
                        zenith_histogram_min,
                    }
                }
                _ => return Err(incomplete()),
            }
        } else {
            ClusteringCut::Triplet {
                triple_min: self.triple_min.ok_or_else(incomplete)?,
            }
        };

        if time_window_separation > time_window {
            return Err(ConfigurationError::SeparationExceedsWindow {
                separation: time_window_separation,
                window: time_window,
            });
        }
        if hit_min > hit_max {
            warn!("hit_min ({hit_min}) exceeds hit_max ({hit_max}), no window can pass");
        }
        if double_velocity_min >= double_velocity_max {
            warn!(
                "double_velocity_min ({double_velocity_min}) is not below double_velocity_max ({double_velocity_max}), no doublet can qualify"
            );
        }

        Ok(TriggerConfig {
            time_window,
            time_window_separation,
            max_trigger_length,
            hit_min,
            hit_max,
            velocity_window: VelocityWindow::new(double_velocity_min, double_velocity_max),
            double_min,
            clustering,
            slcfraction_min,
            sensor_set: self.sensor_set,
        })
    }
}

fn parse<T>(parameter: Parameter, value: &str) -> ConfigurationResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigurationError::InvalidValue {
            name: parameter.into(),
            value: value.to_owned(),
            reason: e.to_string(),
        })
}

fn out_of_range(parameter: Parameter, value: &str, reason: &'static str) -> ConfigurationError {
    ConfigurationError::OutOfRange {
        name: parameter.into(),
        value: value.to_owned(),
        reason,
    }
}

fn positive(parameter: Parameter, value: &str) -> ConfigurationResult<i64> {
    let parsed: i64 = parse(parameter, value)?;
    if parsed > 0 {
        Ok(parsed)
    } else {
        Err(out_of_range(parameter, value, "must be positive"))
    }
}

fn finite_real(parameter: Parameter, value: &str) -> ConfigurationResult<f64> {
    let parsed: f64 = parse(parameter, value)?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(out_of_range(parameter, value, "must be finite"))
    }
}

fn non_negative_real(parameter: Parameter, value: &str) -> ConfigurationResult<f64> {
    let parsed = finite_real(parameter, value)?;
    if parsed >= 0.0 {
        Ok(parsed)
    } else {
        Err(out_of_range(parameter, value, "must not be negative"))
    }
}

fn flag(parameter: Parameter, value: &str) -> ConfigurationResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigurationError::InvalidValue {
            name: parameter.into(),
            value: value.to_owned(),
            reason: "expected true or false".to_owned(),
        }),
    }
}
