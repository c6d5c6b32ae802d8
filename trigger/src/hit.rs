use faint_particle_common::{SensorId, Ticks};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// The hit types a digitiser can report. Only [HitKind::SinglePulse] hits take part in the trigger.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HitKind {
    #[default]
    SinglePulse,
    Other,
}

/// One detected sensor pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub time: Ticks,
    pub sensor: SensorId,
    /// Set for low-gain (soft local coincidence) pulses, clear for high-gain ones.
    #[serde(default)]
    pub low_gain: bool,
    #[serde(default)]
    pub kind: HitKind,
}

impl Hit {
    pub fn new(time: Ticks, sensor: SensorId, low_gain: bool) -> Self {
        Self {
            time,
            sensor,
            low_gain,
            kind: HitKind::SinglePulse,
        }
    }
}

/// Hits are owned by the caller and shared by reference between the
/// sliding window and the trigger accumulator. Containment checks compare
/// identity (see [same_hit]), not value.
pub type SharedHit = Rc<Hit>;

pub(crate) fn same_hit(a: &SharedHit, b: &SharedHit) -> bool {
    Rc::ptr_eq(a, b)
}

/// Appends `hit` unless this very hit is already present.
/// Returns `true` if the hit was appended.
pub(crate) fn push_unique(hits: &mut Vec<SharedHit>, hit: &SharedHit) -> bool {
    if hits.iter().any(|h| same_hit(h, hit)) {
        false
    } else {
        hits.push(hit.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_not_value() {
        let a = Rc::new(Hit::new(5, 1, true));
        let b = Rc::new(Hit::new(5, 1, true));
        let mut hits = Vec::new();
        assert!(push_unique(&mut hits, &a));
        assert!(!push_unique(&mut hits, &a));
        assert!(push_unique(&mut hits, &b));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn kind_defaults_to_single_pulse() {
        let hit: Hit = serde_json::from_str(r#"{"time": 100, "sensor": 7}"#).unwrap();
        assert_eq!(hit, Hit::new(100, 7, false));

        let hit: Hit =
            serde_json::from_str(r#"{"time": 1, "sensor": 2, "low_gain": true, "kind": "other"}"#)
                .unwrap();
        assert_eq!(hit.kind, HitKind::Other);
        assert!(hit.low_gain);
    }
}
