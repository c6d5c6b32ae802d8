mod generate;
mod scenario;

use anyhow::Context;
use clap::Parser;
use faint_particle_common::init_tracer;
use faint_particle_trigger::DetectorDescription;
use rand::{SeedableRng, rngs::StdRng};
use scenario::Scenario;
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::PathBuf,
};
use tracing::{info, level_filters::LevelFilter};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// JSON file describing sensor positions
    #[clap(long)]
    detector: PathBuf,

    /// JSON scenario file
    #[clap(long)]
    scenario: PathBuf,

    /// File to write the JSON-lines hit stream to, stdout if not given
    #[clap(long)]
    output: Option<PathBuf>,

    /// Overrides the scenario's seed
    #[clap(long)]
    seed: Option<u64>,

    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let _tracer = init_tracer!(args.log_level);

    let detector = DetectorDescription::load(&args.detector)
        .with_context(|| format!("Cannot load detector from {}", args.detector.display()))?;

    let file = File::open(&args.scenario)
        .with_context(|| format!("Cannot open scenario {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Cannot parse scenario {}", args.scenario.display()))?;

    let mut rng = match args.seed.or(scenario.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let hits = generate::generate(&scenario, &detector, &mut rng)?;

    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Cannot create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for hit in &hits {
        serde_json::to_writer(&mut output, hit)?;
        output.write_all(b"\n")?;
    }
    output.flush()?;

    info!("{} hits written", hits.len());
    Ok(())
}
