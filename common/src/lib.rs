pub mod metrics;
pub mod tracer;

/// Identifies a single sensor of the array.
pub type SensorId = u32;

/// Hit times, counted in ticks of the detector clock.
pub type Ticks = i64;

/// Identifies a named subset of sensors in a detector description.
pub type SensorSetId = u32;

/// Detector clock ticks per nanosecond (one tick is 0.1 ns).
pub const TICKS_PER_NANOSECOND: Ticks = 10;

/// Scales an apparent speed measured in metres per tick to kilometres per second.
///
/// One metre per tick is 1e10 m/s, which is 1e7 km/s.
pub const KILOMETRES_PER_SECOND_PER_METRE_PER_TICK: f64 = 1e7;

/// Converts a duration configured in nanoseconds to detector ticks.
pub fn nanoseconds_to_ticks(nanoseconds: i64) -> Ticks {
    nanoseconds.saturating_mul(TICKS_PER_NANOSECOND)
}
