//! Relief CLI - terrain sculpting for relief shading

mod terrain;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use relief_algorithms::filter::{
    FilterOutcome, FilterOutput, LayerKind, ProgressSink, ReliefFilter, ReliefParams, Stage,
};
use relief_algorithms::render::{mean_gray, shaded_relief, LightDirection};
use relief_core::Grid;
use relief_parallel::ProcessingMode;
use terrain::{ridges_and_valleys, TerrainOptions};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "relief")]
#[command(author, version, about = "Terrain sculpting for relief shading", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sculpt synthetic terrain and print statistics of every layer
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Print the default parameters as JSON
    Params {
        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare shaded relief of the original and the sculpted terrain
    Shade {
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Light azimuth in degrees (0=North, clockwise)
        #[arg(short, long, default_value = "315")]
        azimuth: f64,
        /// Light zenith angle in degrees from the vertical
        #[arg(short, long, default_value = "45")]
        zenith: f64,
    },
}

#[derive(Args)]
struct PipelineArgs {
    /// Rows and columns of the synthetic terrain
    #[arg(short, long, default_value = "256")]
    size: usize,
    /// Cell size in meters
    #[arg(short, long, default_value = "30.0")]
    cell_size: f64,
    /// Phase offset of the ridge pattern in degrees
    #[arg(long, default_value = "0")]
    seed: u32,
    /// Cut a hole of void cells into the terrain
    #[arg(long)]
    voids: bool,
    /// JSON parameter file; missing fields keep their defaults
    #[arg(short, long)]
    params: Option<PathBuf>,
    /// Worker threads (0 = all cores, 1 = sequential)
    #[arg(short, long, default_value = "0")]
    threads: usize,
}

// ─── Progress ───────────────────────────────────────────────────────────

/// Progress bar fed by the filter
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for BarProgress {
    fn set_total_stage_count(&mut self, count: usize) {
        debug!(stages = count, "starting filter pass");
    }

    fn on_stage_begin(&mut self, stage: Stage) {
        self.bar.set_message(stage.message());
    }

    fn on_progress_percent(&mut self, percent: u32) -> bool {
        self.bar.set_position(percent.into());
        true
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn load_params(path: Option<&Path>) -> Result<ReliefParams> {
    let Some(path) = path else {
        return Ok(ReliefParams::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameters from {}", path.display()))?;
    let params: ReliefParams =
        serde_json::from_str(&text).with_context(|| format!("Invalid parameters in {}", path.display()))?;
    params.validate().context("Invalid parameters")?;
    Ok(params)
}

fn params_json() -> Result<String> {
    serde_json::to_string_pretty(&ReliefParams::default()).context("Failed to serialize parameters")
}

/// Build the terrain, run one filter pass and report its duration
fn sculpt(args: &PipelineArgs) -> Result<FilterOutput> {
    let params = load_params(args.params.as_deref())?;
    let grid = ridges_and_valleys(TerrainOptions {
        size: args.size,
        cell_size: args.cell_size,
        seed: args.seed,
        voids: args.voids,
    })
    .context("Failed to build terrain")?;
    let (min_x, min_y, max_x, max_y) = grid.geometry().bounds(grid.cols(), grid.rows());
    info!("Input: {} x {}, cell size {}", grid.cols(), grid.rows(), grid.cell_size());
    debug!("Bounds: ({min_x:.1}, {min_y:.1}) - ({max_x:.1}, {max_y:.1})");

    let mut filter = ReliefFilter::with_params(params);
    let mode = ProcessingMode::from_threads(args.threads);
    debug!("Processing mode: {:?} ({} threads)", mode, mode.num_threads());
    filter.set_processing_mode(mode);
    filter.set_grid(Some(grid)).context("Failed to load terrain")?;

    let start = Instant::now();
    let mut progress = BarProgress::new()?;
    let outcome = filter.filter(&mut progress);
    progress.finish();

    match outcome.context("Filter failed")? {
        FilterOutcome::Completed(output) => {
            println!("  Processing time: {:.2?}", start.elapsed());
            Ok(output)
        }
        FilterOutcome::Cancelled => anyhow::bail!("Filter was cancelled"),
        FilterOutcome::Empty => anyhow::bail!("No terrain loaded"),
    }
}

fn print_layer(kind: LayerKind, grid: &Grid) {
    let stats = grid.statistics();
    let fmt = |v: Option<f32>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
    println!(
        "  {:<20} min {:>12}  max {:>12}  mean {:>12}  voids {}",
        kind.name(),
        fmt(stats.min),
        fmt(stats.max),
        stats.mean.map_or_else(|| "-".to_string(), |m| format!("{m:.4}")),
        stats.void_count
    );
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Run { pipeline } => {
            let output = sculpt(&pipeline)?;
            println!("\nLayers:");
            for (kind, grid) in output.layers() {
                print_layer(kind, grid);
            }
        }

        Commands::Params { output } => {
            let json = params_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Parameters saved to: {}", path.display());
                }
                None => println!("{json}"),
            }
        }

        Commands::Shade {
            pipeline,
            azimuth,
            zenith,
        } => {
            let output = sculpt(&pipeline)?;
            let light = LightDirection { azimuth, zenith };
            for kind in [LayerKind::Original, LayerKind::Result] {
                match shaded_relief(output.get(kind), light) {
                    Some(image) => {
                        let (rows, cols) = image.dim();
                        println!(
                            "  {:<14} shaded relief {} x {}, mean gray {:.1}",
                            kind.name(),
                            cols,
                            rows,
                            mean_gray(&image)
                        );
                    }
                    None => println!("  {:<14} too small to shade", kind.name()),
                }
            }
        }
    }

    Ok(())
}
