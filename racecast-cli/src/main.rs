mod reports;
mod seeds;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use racecast_engine::{
    BUNDLED_DRIVER_TABLE, BUNDLED_TRACK_TABLE, DEFAULT_TRACK_KEY, DriverCode, Factor,
    FeatureWeights, RaceEngine, TableLoader,
};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use seeds::{SeedInfo, resolve_seed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored tables for the terminal
    Console,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "racecast", version)]
#[command(about = "Seeded F1 qualifying simulations and race predictions")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console, global = true)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Extra driver tables merged over the bundled one, in order
    #[arg(long = "drivers-file", global = true)]
    drivers_files: Vec<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the bundled circuits
    Tracks,
    /// List the driver registry after merging
    Drivers,
    /// Simulate a qualifying session
    Qualify(WeekendArgs),
    /// Qualify, then predict the race
    Predict(PredictArgs),
    /// Aggregate many seeded weekends on one track
    Batch(BatchArgs),
}

#[derive(Debug, clap::Args)]
struct WeekendArgs {
    /// Track key (see `racecast tracks`)
    #[arg(long, default_value = DEFAULT_TRACK_KEY)]
    track: String,

    /// Numeric seed; the printed share code replays it
    #[arg(long)]
    seed: Option<u64>,

    /// Share code such as GP-APEX42 (CX- codes enable chaos)
    #[arg(long)]
    code: Option<String>,

    /// Enable chaos mode
    #[arg(long)]
    chaos: bool,
}

#[derive(Debug, clap::Args)]
struct PredictArgs {
    #[command(flatten)]
    weekend: WeekendArgs,

    /// Factor weight override, e.g. `--weight pace=0.5` (repeatable)
    #[arg(long = "weight", value_parser = parse_weight)]
    weights: Vec<(Factor, f64)>,

    /// Replace the qualifying order (comma-separated driver codes)
    #[arg(long, value_delimiter = ',')]
    grid: Vec<String>,
}

#[derive(Debug, clap::Args)]
struct BatchArgs {
    /// Track key (see `racecast tracks`)
    #[arg(long, default_value = DEFAULT_TRACK_KEY)]
    track: String,

    /// First seed of the sweep
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Number of consecutive seeds to run
    #[arg(long, default_value_t = 100)]
    runs: u64,

    /// Enable chaos mode
    #[arg(long)]
    chaos: bool,

    /// Factor weight override, e.g. `--weight team=0` (repeatable)
    #[arg(long = "weight", value_parser = parse_weight)]
    weights: Vec<(Factor, f64)>,
}

/// Bundled tables, optionally patched by driver tables read from disk.
struct FileTables {
    drivers_files: Vec<PathBuf>,
}

impl TableLoader for FileTables {
    type Error = std::io::Error;

    fn driver_layers(&self) -> Result<Vec<String>, Self::Error> {
        let mut layers = vec![BUNDLED_DRIVER_TABLE.to_string()];
        for path in &self.drivers_files {
            log::info!("merging driver table {}", path.display());
            layers.push(std::fs::read_to_string(path)?);
        }
        Ok(layers)
    }

    fn track_table(&self) -> Result<String, Self::Error> {
        Ok(BUNDLED_TRACK_TABLE.to_string())
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start_time = Instant::now();

    let engine = load_engine(&args)?;
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match &args.command {
        Command::Tracks => write_tracks(&args, &engine, &mut output_target)?,
        Command::Drivers => write_drivers(&args, &engine, &mut output_target)?,
        Command::Qualify(weekend) => run_qualifying(&args, &engine, weekend, &mut output_target)?,
        Command::Predict(predict) => run_prediction(&args, &engine, predict, &mut output_target)?,
        Command::Batch(batch) => run_batch(&args, &engine, batch, &mut output_target)?,
    }

    output_target.flush_inner()?;
    log::debug!("finished in {:?}", start_time.elapsed());
    Ok(())
}

fn load_engine(args: &Args) -> Result<RaceEngine> {
    let loader = FileTables {
        drivers_files: args.drivers_files.clone(),
    };
    let engine = RaceEngine::load(&loader).context("failed to load race tables")?;
    let report = engine.drivers().report();
    for code in &report.merged {
        log::info!("driver {code} defined more than once; later fields win");
    }
    for excluded in &report.excluded {
        log::warn!(
            "driver {} excluded, missing {}",
            excluded.code,
            excluded.missing.join(", ")
        );
    }
    Ok(engine)
}

fn parse_weight(raw: &str) -> Result<(Factor, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))?;
    let factor: Factor = name.parse()?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid {factor} weight {value:?}: {e}"))?;
    Ok((factor, value))
}

fn build_weights(overrides: &[(Factor, f64)]) -> Result<FeatureWeights> {
    let requested = overrides
        .iter()
        .fold(FeatureWeights::default(), |weights, &(factor, value)| {
            weights.with(factor, value)
        });
    let weights = requested.sanitized()?;
    if weights != requested {
        log::warn!("weights clamped to [0, 1]");
    }
    Ok(weights)
}

fn resolve_weekend_seed(weekend: &WeekendArgs) -> Result<SeedInfo> {
    resolve_seed(weekend.seed, weekend.code.as_deref(), weekend.chaos)
}

fn write_tracks(args: &Args, engine: &RaceEngine, out: &mut OutputTarget) -> Result<()> {
    match args.report {
        ReportFormat::Json => {
            let tracks: Vec<_> = engine.tracks().iter().collect();
            reports::generate_json_report(out, &tracks)
        }
        ReportFormat::Console => reports::track_listing(out, engine.tracks()),
    }
}

fn write_drivers(args: &Args, engine: &RaceEngine, out: &mut OutputTarget) -> Result<()> {
    match args.report {
        ReportFormat::Json => {
            let drivers: Vec<_> = engine.drivers().iter().collect();
            reports::generate_json_report(out, &drivers)
        }
        ReportFormat::Console => reports::driver_listing(out, engine.drivers()),
    }
}

fn run_qualifying(
    args: &Args,
    engine: &RaceEngine,
    weekend_args: &WeekendArgs,
    out: &mut OutputTarget,
) -> Result<()> {
    let seed = resolve_weekend_seed(weekend_args)?;
    let mut weekend = engine.weekend(seed.seed);
    let track = weekend.select_track(&weekend_args.track)?;
    let grid = weekend.ensure_grid()?;
    match args.report {
        ReportFormat::Json => reports::qualifying_json(out, track, &seed, grid),
        ReportFormat::Console => reports::qualifying_console(out, track, &seed, grid),
    }
}

fn run_prediction(
    args: &Args,
    engine: &RaceEngine,
    predict: &PredictArgs,
    out: &mut OutputTarget,
) -> Result<()> {
    let seed = resolve_weekend_seed(&predict.weekend)?;
    let mut weekend = engine.weekend(seed.seed);
    weekend.set_chaos(seed.chaos);
    let track = weekend.select_track(&predict.weekend.track)?;
    weekend.set_weights(build_weights(&predict.weights)?)?;

    if !predict.grid.is_empty() {
        let order = predict
            .grid
            .iter()
            .map(|code| DriverCode::parse(code.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        weekend.begin_grid_edit()?;
        if let Err(err) = weekend.apply_grid_edit(&order) {
            weekend.cancel_grid_edit();
            bail!("--grid must list every qualifier exactly once: {err}");
        }
    }

    let result = weekend.predict()?;
    let grid = weekend.ensure_grid()?;
    match args.report {
        ReportFormat::Json => reports::prediction_json(out, track, &seed, grid, &result),
        ReportFormat::Console => reports::prediction_console(out, track, &seed, &result),
    }
}

fn run_batch(
    args: &Args,
    engine: &RaceEngine,
    batch: &BatchArgs,
    out: &mut OutputTarget,
) -> Result<()> {
    if batch.runs == 0 {
        bail!("--runs must be at least 1");
    }
    let track = engine.tracks().require(&batch.track)?;
    let weights = build_weights(&batch.weights)?;
    let seeds = (0..batch.runs).map(|i| batch.seed.wrapping_add(i));
    if args.report == ReportFormat::Console {
        eprintln!(
            "{} {} weekends at {}",
            "🔁 Simulating".bright_yellow(),
            batch.runs,
            track.name
        );
    }
    let summary = engine.batch(&track.key, &weights, batch.chaos, seeds)?;
    match args.report {
        ReportFormat::Json => reports::generate_json_report(out, &summary),
        ReportFormat::Console => reports::batch_console(out, track, &summary),
    }
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
