//! Zonal maximum command line tool.
//!
//! Reads a float raster grid and a GeoJSON region layer, computes the
//! maximum cell value per region and writes it out as a delimited table.

mod config_loader;
mod pipeline;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config_loader::{load_run_config, validate_run_config, LoggingConfig, OutputConfig, RunConfig};
use zonal_common::CrsCode;
use zonal_stats::ZonalConfig;

#[derive(Parser, Debug)]
#[command(name = "zonal")]
#[command(about = "Maximum raster value per administrative region")]
struct Args {
    /// Run file path; flags below override its values
    #[arg(short, long, env = "ZONAL_CONFIG")]
    config: Option<PathBuf>,

    /// ESRI float grid (.flt or .hdr)
    #[arg(short, long)]
    grid: Option<PathBuf>,

    /// CRS of the grid, e.g. 4326 or EPSG:4326
    #[arg(long)]
    grid_crs: Option<CrsCode>,

    /// GeoJSON region layer
    #[arg(short, long)]
    regions: Option<PathBuf>,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the regions with the statistic attribute as GeoJSON
    #[arg(long)]
    geojson_output: Option<PathBuf>,

    /// CRS both inputs are normalized into
    #[arg(long)]
    target_crs: Option<CrsCode>,

    /// CRS assumed for inputs that do not declare one
    #[arg(long)]
    assume_crs: Option<CrsCode>,

    /// Process regions one at a time
    #[arg(long)]
    sequential: bool,

    /// Log level
    #[arg(long, env = "ZONAL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json or pretty)
    #[arg(long)]
    log_format: Option<String>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = build_run_config(args)?;
    validate_run_config(&config)?;

    init_tracing(&config.logging)?;

    info!(
        grid = %config.grid.display(),
        regions = %config.regions.display(),
        target_crs = %config.engine.target_crs,
        parallel = config.engine.parallel,
        "Starting zonal maximum run"
    );

    pipeline::run(&config)?;

    Ok(())
}

/// Merge the optional run file with command line overrides.
fn build_run_config(args: Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => load_run_config(path)?,
        None => RunConfig {
            grid: args.grid.clone().context("--grid is required without --config")?,
            grid_crs: None,
            regions: args
                .regions
                .clone()
                .context("--regions is required without --config")?,
            output: OutputConfig {
                csv: args
                    .output
                    .clone()
                    .context("--output is required without --config")?,
                geojson: None,
                columns: Vec::new(),
                summary: None,
            },
            engine: ZonalConfig::from_env(),
            logging: LoggingConfig::default(),
        },
    };

    if let Some(grid) = args.grid {
        config.grid = grid;
    }
    if let Some(regions) = args.regions {
        config.regions = regions;
    }
    if let Some(csv) = args.output {
        config.output.csv = csv;
    }
    if args.geojson_output.is_some() {
        config.output.geojson = args.geojson_output;
    }
    if args.grid_crs.is_some() {
        config.grid_crs = args.grid_crs;
    }
    if let Some(target) = args.target_crs {
        config.engine.target_crs = target;
    }
    if args.assume_crs.is_some() {
        config.engine.assume_crs = args.assume_crs;
    }
    if args.sequential {
        config.engine.parallel = false;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level.to_lowercase();
    }
    if let Some(format) = args.log_format {
        config.logging.format = format.to_lowercase();
    }

    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let level = match logging.level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.format == "pretty" {
        tracing::subscriber::set_global_default(builder.pretty().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    }

    Ok(())
}
