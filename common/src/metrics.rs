use const_format::concatcp;
use metrics::{describe_counter, describe_gauge, gauge};

pub fn component_info_metric(name: &'static str) {
    static NAME: &str = concatcp!(names::METRIC_NAME_PREFIX, "component_info");

    describe_gauge!(NAME, "Basic information about the component");

    let git_rev = option_env!("GIT_VERSION").unwrap_or("unknown");
    gauge!(NAME, "component" => name, "git_version" => git_rev).set(1);
}

/// Registers descriptions for every counter in [names].
pub fn describe_counters() {
    use names::*;

    describe_counter!(HITS_RECEIVED, metrics::Unit::Count, "Hits offered to the trigger");
    describe_counter!(
        HITS_REJECTED,
        metrics::Unit::Count,
        "Hits dropped by the usability filter"
    );
    describe_counter!(
        WINDOWS_CLASSIFIED,
        metrics::Unit::Count,
        "Sliding windows run through the classifier"
    );
    describe_counter!(
        WINDOW_CUT_FAILURES,
        metrics::Unit::Count,
        "Classified windows rejected, by the first failing cut"
    );
    describe_counter!(TRIGGERS_EMITTED, metrics::Unit::Count, "Triggers emitted");
    describe_counter!(
        OVERLONG_TRIGGERS,
        metrics::Unit::Count,
        "Triggers flushed because a merge exceeded the maximum trigger length"
    );
    describe_counter!(FAILURES, metrics::Unit::Count, "Failures by kind");
}

pub mod names {
    use const_format::concatcp;

    pub const METRIC_NAME_PREFIX: &str = "faint_particle_trigger_";

    pub const FAILURES: &str = concatcp!(METRIC_NAME_PREFIX, "failures");
    pub const HITS_RECEIVED: &str = concatcp!(METRIC_NAME_PREFIX, "hits_received");
    pub const HITS_REJECTED: &str = concatcp!(METRIC_NAME_PREFIX, "hits_rejected");
    pub const WINDOWS_CLASSIFIED: &str = concatcp!(METRIC_NAME_PREFIX, "windows_classified");
    pub const WINDOW_CUT_FAILURES: &str = concatcp!(METRIC_NAME_PREFIX, "window_cut_failures");
    pub const TRIGGERS_EMITTED: &str = concatcp!(METRIC_NAME_PREFIX, "triggers_emitted");
    pub const OVERLONG_TRIGGERS: &str = concatcp!(METRIC_NAME_PREFIX, "overlong_triggers");
}

pub mod window_cuts {
    #[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
    pub enum CutKind {
        HitCount,
        Doublet,
        Direction,
        Triplet,
        SignalFraction,
    }

    // Label building function
    pub fn get_label(cut_kind: CutKind) -> (&'static str, &'static str) {
        (
            "cut",
            match cut_kind {
                CutKind::HitCount => "hit_count",
                CutKind::Doublet => "doublet",
                CutKind::Direction => "direction",
                CutKind::Triplet => "triplet",
                CutKind::SignalFraction => "signal_fraction",
            },
        )
    }
}

pub mod failures {
    #[derive(Debug, Clone, Eq, Hash, PartialEq)]
    pub enum FailureKind {
        FileWriteFailed,
        HitOutOfOrder,
        HitTimeOutOfRange,
        UnableToDecodeHit,
    }

    // Label building function
    pub fn get_label(failure_kind: FailureKind) -> (&'static str, &'static str) {
        (
            "failure_kind",
            match failure_kind {
                FailureKind::FileWriteFailed => "file_write_failed",
                FailureKind::HitOutOfOrder => "hit_out_of_order",
                FailureKind::HitTimeOutOfRange => "hit_time_out_of_range",
                FailureKind::UnableToDecodeHit => "unable_to_decode_hit",
            },
        )
    }
}
