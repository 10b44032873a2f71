use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use snap_integrator::{
    find_snap_candidates,
    util::{read_line_layer, read_polygon_layer, write_snap_layer},
    FeatureId, Monitor, SnapConfig, SnapOutcome, SnapRequest, Tolerance,
};
use std::{path::PathBuf, time::Instant};
use tracing::{debug, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

/// Find endpoints where exactly two roads end without being snapped,
/// strictly inside a boundary polygon.
#[derive(Parser, Debug)]
#[command(name = "snap-integrator", version, about)]
struct Args {
    /// GeoJSON polygon layer holding the boundary.
    #[arg(long)]
    boundary: PathBuf,

    /// GeoJSON line layer (roads).
    #[arg(long)]
    lines: PathBuf,

    /// Boundary feature to use. Defaults to every feature, which only works
    /// for a single-feature layer.
    #[arg(long = "select", value_name = "ID")]
    selection: Vec<FeatureId>,

    /// Only report pairs whose lines differ on this attribute.
    #[arg(long, env = "SNAP_FIELD")]
    field: Option<String>,

    /// Where to write the candidate points.
    #[arg(long, short, env = "SNAP_OUTPUT", default_value = "SnapIntegrator_Points.geojson")]
    output: PathBuf,

    /// Also write the output file when there are no candidates.
    #[arg(long)]
    write_empty: bool,

    #[arg(long, env = "SNAP_ROUNDING_PRECISION")]
    rounding_precision: Option<f64>,

    #[arg(long, env = "SNAP_EROSION_DISTANCE")]
    erosion_distance: Option<f64>,

    /// JSON file with `field` and `tolerance` settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase logging verbosity. `RUST_LOG` takes priority.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> anyhow::Result<SnapConfig> {
        let mut config = match &self.config {
            Some(path) => SnapConfig::from_file(path)
                .with_context(|| format!("Could not read config file {path:?}."))?,
            None => SnapConfig::default(),
        };
        if self.field.is_some() {
            config.field.clone_from(&self.field);
        }
        config.tolerance = Tolerance::new(
            self.rounding_precision
                .unwrap_or(config.tolerance.rounding_precision),
            self.erosion_distance
                .unwrap_or(config.tolerance.erosion_distance),
        )?;
        Ok(config)
    }

    fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Logs progress in tenths.
struct ProgressLog {
    last: usize,
}

impl Monitor for ProgressLog {
    fn progress(&mut self, done: usize, total: usize) {
        let tenth = done * 10 / total.max(1);
        if tenth > self.last {
            self.last = tenth;
            debug!("Processing... {}%", tenth * 10);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(args.level().into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = args.config()?;
    let boundary_layer = read_polygon_layer(&args.boundary)
        .with_context(|| format!("Could not read boundary layer {:?}.", args.boundary))?;
    let line_layer = read_line_layer(&args.lines)
        .with_context(|| format!("Could not read line layer {:?}.", args.lines))?;
    let selection = if args.selection.is_empty() {
        boundary_layer.ids()
    } else {
        args.selection.clone()
    };
    let boundary = boundary_layer
        .select(&selection)
        .context("Could not select the boundary polygon.")?;

    let start = Instant::now();
    let request = SnapRequest::new(&line_layer, &boundary)
        .field(config.field.as_deref())
        .tolerance(config.tolerance);
    let outcome = find_snap_candidates(&request, &mut ProgressLog { last: 0 })?;
    info!("Snap integrator time execution: {:?}", start.elapsed());

    match &outcome {
        SnapOutcome::Found(layer) => write_snap_layer(layer, &args.output)?,
        SnapOutcome::Empty(layer) if args.write_empty => write_snap_layer(layer, &args.output)?,
        SnapOutcome::Empty(_) | SnapOutcome::Cancelled => (),
    }
    outcome.summary();
    if outcome.is_found() || (args.write_empty && outcome.is_empty()) {
        println!("{0: <25}{1: >25}", "Output", args.output.display().to_string().bold());
    }
    Ok(())
}
