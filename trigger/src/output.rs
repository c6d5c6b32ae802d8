//! Writes emitted triggers as JSON lines.
use crate::{
    engine::TRIGGER_TYPE,
    hit::Hit,
    services::{CandidateTrigger, TriggerSink},
};
use faint_particle_common::{
    Ticks,
    metrics::{
        failures::{self, FailureKind},
        names::FAILURES,
    },
};
use metrics::counter;
use serde::Serialize;
use std::io::Write;
use tracing::error;

/// One output line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriggerRecord<'a> {
    pub trigger_name: &'a str,
    pub trigger_type: i32,
    pub number: u64,
    pub first_time: Option<Ticks>,
    pub last_time: Option<Ticks>,
    pub hits: Vec<&'a Hit>,
}

impl<'a> TriggerRecord<'a> {
    pub fn new(trigger_name: &'a str, trigger: &'a CandidateTrigger) -> Self {
        Self {
            trigger_name,
            trigger_type: TRIGGER_TYPE,
            number: trigger.number,
            first_time: trigger.first_time(),
            last_time: trigger.last_time(),
            hits: trigger.hits.iter().map(|hit| &**hit).collect(),
        }
    }
}

/// A [TriggerSink] writing one [TriggerRecord] per line.
///
/// A failed write is logged and counted, and does not stop the trigger.
pub struct JsonLinesSink<W> {
    writer: W,
    trigger_name: String,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W, trigger_name: &str) -> Self {
        Self {
            writer,
            trigger_name: trigger_name.to_owned(),
            written: 0,
        }
    }

    /// Number of triggers successfully written.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, trigger: &CandidateTrigger) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, &TriggerRecord::new(&self.trigger_name, trigger))?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> TriggerSink for JsonLinesSink<W> {
    fn emit(&mut self, trigger: CandidateTrigger) {
        match self.write_record(&trigger) {
            Ok(()) => self.written += 1,
            Err(e) => {
                error!("Failed to write trigger #{}: {e}", trigger.number);
                counter!(
                    FAILURES,
                    &[failures::get_label(FailureKind::FileWriteFailed)]
                )
                .increment(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io, rc::Rc};

    fn candidate() -> CandidateTrigger {
        CandidateTrigger {
            number: 4,
            hits: vec![
                Rc::new(Hit::new(10, 1, true)),
                Rc::new(Hit::new(25, 2, false)),
            ],
        }
    }

    #[test]
    fn writes_one_line_per_trigger() {
        let mut sink = JsonLinesSink::new(Vec::new(), "FPT");
        sink.emit(candidate());
        sink.emit(candidate());
        assert_eq!(sink.written(), 2);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["trigger-name"], "FPT");
        assert_eq!(record["trigger-type"], 33);
        assert_eq!(record["number"], 4);
        assert_eq!(record["first-time"], 10);
        assert_eq!(record["last-time"], 25);
        assert_eq!(record["hits"][1]["sensor"], 2);
        assert_eq!(record["hits"][0]["low_gain"], true);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_not_fatal() {
        let mut sink = JsonLinesSink::new(BrokenPipe, "FPT");
        sink.emit(candidate());
        sink.emit(candidate());
        assert_eq!(sink.written(), 0);
    }
}
