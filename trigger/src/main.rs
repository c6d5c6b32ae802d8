use anyhow::{Context, anyhow};
use clap::Parser;
use faint_particle_common::{
    init_tracer,
    metrics::{
        component_info_metric, describe_counters,
        failures::{self, FailureKind},
        names::FAILURES,
    },
};
use faint_particle_trigger::{
    DetectorDescription, FaintParticleTrigger, Hit, SensorSetFilter, SensorTable, TriggerConfig,
    TriggerConfigBuilder, TriggerError, engine::DEFAULT_TRIGGER_NAME, output::JsonLinesSink,
};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    net::SocketAddr,
    path::{Path, PathBuf},
    rc::Rc,
    str::FromStr,
};
use tracing::{info, level_filters::LevelFilter, warn};

/// A `name=value` trigger parameter given on the command line.
#[derive(Debug, Clone)]
struct ParameterAssignment {
    name: String,
    value: String,
}

impl FromStr for ParameterAssignment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected pattern 'name=value', got '{s}'"))?;
        Ok(ParameterAssignment {
            name: name.trim().to_owned(),
            value: value.trim().to_owned(),
        })
    }
}

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// JSON file describing sensor positions and sensor sets
    #[clap(long)]
    detector: PathBuf,

    /// JSON-lines hit stream, read from stdin if not given
    #[clap(long)]
    hits: Option<PathBuf>,

    /// File to write triggers to as JSON lines, stdout if not given
    #[clap(long)]
    output: Option<PathBuf>,

    /// JSON object of trigger parameters, applied before any `--parameter`
    #[clap(long)]
    parameter_file: Option<PathBuf>,

    /// Trigger parameter, as `name=value`. May be repeated
    #[clap(short, long = "parameter")]
    parameters: Vec<ParameterAssignment>,

    #[clap(long)]
    trigger_name: Option<String>,

    /// If set, Prometheus metrics are served on this address
    #[clap(long, env)]
    observability_address: Option<SocketAddr>,

    /// Used when `RUST_LOG` is not set
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let _tracer = init_tracer!(args.log_level);

    if let Some(address) = args.observability_address {
        PrometheusBuilder::new()
            .with_http_listener(address)
            .install()
            .with_context(|| format!("Cannot serve metrics on {address}"))?;
    }
    component_info_metric("faint-particle-trigger");
    describe_counters();

    let config = load_config(args.parameter_file.as_deref(), &args.parameters)?;

    let description = DetectorDescription::load(&args.detector)
        .with_context(|| format!("Cannot load detector from {}", args.detector.display()))?;
    let filter = SensorSetFilter::from_description(&description, config.sensor_set())?;
    let geometry = SensorTable::new(&description);

    let trigger_name = args.trigger_name.as_deref().unwrap_or(DEFAULT_TRIGGER_NAME);
    let sink = JsonLinesSink::new(open_output(args.output.as_deref())?, trigger_name);

    let mut trigger = FaintParticleTrigger::new(config, geometry, filter, sink);
    if let Some(name) = &args.trigger_name {
        trigger.set_trigger_name(name);
    }

    let input = open_input(args.hits.as_deref())?;
    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let line = line.context("Cannot read hit stream")?;
        if line.trim().is_empty() {
            continue;
        }

        let hit: Hit = match serde_json::from_str(&line) {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Line {line_number}: cannot decode hit: {e}");
                counter!(
                    FAILURES,
                    &[failures::get_label(FailureKind::UnableToDecodeHit)]
                )
                .increment(1);
                continue;
            }
        };

        match trigger.process(Rc::new(hit)) {
            Ok(()) => {}
            Err(e @ TriggerError::TimeOutOfRange { .. }) => {
                warn!("Line {line_number}: {e}");
                counter!(
                    FAILURES,
                    &[failures::get_label(FailureKind::HitTimeOutOfRange)]
                )
                .increment(1);
            }
            Err(e @ TriggerError::OutOfOrder { .. }) => {
                counter!(
                    FAILURES,
                    &[failures::get_label(FailureKind::HitOutOfOrder)]
                )
                .increment(1);
                return Err(e).with_context(|| format!("Line {line_number}"));
            }
        }
    }

    trigger.finish_run();
    let mut sink = trigger.into_sink();
    sink.flush().context("Cannot flush trigger output")?;
    info!("{} triggers written", sink.written());
    Ok(())
}

/// Applies the parameter file, if any, then the command line parameters.
fn load_config(
    parameter_file: Option<&Path>,
    parameters: &[ParameterAssignment],
) -> anyhow::Result<TriggerConfig> {
    let mut builder = TriggerConfigBuilder::new();

    if let Some(path) = parameter_file {
        let file = File::open(path)
            .with_context(|| format!("Cannot open parameter file {}", path.display()))?;
        let values: BTreeMap<String, serde_json::Value> =
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Cannot parse parameter file {}", path.display()))?;
        for (name, value) in values {
            let value = match value {
                serde_json::Value::String(value) => value,
                other => other.to_string(),
            };
            builder
                .add_parameter(&name, &value)
                .with_context(|| format!("In parameter file {}", path.display()))?;
        }
    }

    for ParameterAssignment { name, value } in parameters {
        builder.add_parameter(name, value)?;
    }

    Ok(builder.build()?)
}

fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Cannot open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    })
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Cannot create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
