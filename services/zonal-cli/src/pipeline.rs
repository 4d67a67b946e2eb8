//! One pass of the zonal maximum pipeline.
//!
//! Load grid and regions, normalize both into the target CRS, overlay,
//! then write the delimited table and the optional outputs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use zonal_common::CrsCode;
use zonal_stats::{
    read_esri_float_grid, read_regions, write_delimited, write_regions, CrsNormalizer,
    ZonalOverlay,
};

use crate::config_loader::RunConfig;

/// What a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub target_crs: CrsCode,
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub regions: usize,
    pub with_data: usize,
    pub no_data: usize,
    /// Largest statistic over all regions
    pub max_value: Option<f32>,
    pub csv: PathBuf,
    pub geojson: Option<PathBuf>,
    pub elapsed_ms: u64,
}

pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let started_at = Utc::now();
    let started = Instant::now();
    let engine = &config.engine;

    let grid = read_esri_float_grid(&config.grid, config.grid_crs)
        .with_context(|| format!("Failed to load grid {:?}", config.grid))?;
    let regions = read_regions(&config.regions, &engine.fields, None)
        .with_context(|| format!("Failed to load regions {:?}", config.regions))?;

    let normalizer = CrsNormalizer::from_config(engine);
    let grid = normalizer
        .normalize_grid(grid)
        .context("Failed to normalize grid CRS")?;
    let mut regions = normalizer
        .normalize_regions(regions)
        .context("Failed to normalize region CRS")?;

    let table = ZonalOverlay::new(engine)
        .compute(&grid, &mut regions)
        .context("Zonal overlay failed")?;

    let columns: Vec<&str> = if config.output.columns.is_empty() {
        vec![engine.fields.identifier.as_str(), engine.fields.statistic.as_str()]
    } else {
        config.output.columns.iter().map(String::as_str).collect()
    };

    ensure_parent(&config.output.csv)?;
    write_delimited(&config.output.csv, &table, &columns)
        .with_context(|| format!("Failed to write {:?}", config.output.csv))?;

    if let Some(path) = &config.output.geojson {
        ensure_parent(path)?;
        write_regions(path, &regions, &engine.fields)
            .with_context(|| format!("Failed to write {:?}", path))?;
    }

    let counts = table.counts();
    let max_value = table
        .iter()
        .filter_map(|row| row.value)
        .fold(None, |acc: Option<f32>, v| Some(acc.map_or(v, |a| a.max(v))));

    let summary = RunSummary {
        started_at,
        target_crs: normalizer.target(),
        grid_rows: grid.rows(),
        grid_cols: grid.cols(),
        regions: counts.regions,
        with_data: counts.with_data,
        no_data: counts.no_data,
        max_value,
        csv: config.output.csv.clone(),
        geojson: config.output.geojson.clone(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    if let Some(path) = &config.output.summary {
        ensure_parent(path)?;
        fs::write(path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("Failed to write summary {:?}", path))?;
    }

    info!(
        regions = summary.regions,
        with_data = summary.with_data,
        no_data = summary.no_data,
        max_value = ?summary.max_value,
        elapsed_ms = summary.elapsed_ms,
        csv = %summary.csv.display(),
        "Run complete"
    );

    Ok(summary)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }
    Ok(())
}
